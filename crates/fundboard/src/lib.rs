//! `fundboard` - fundraising progress and project administration for a small
//! nonprofit site
//!
//! This library holds the project record store, the public progress
//! dashboard, the single-admin session guard and the edit workflow, plus the
//! axum router that exposes them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod donation;
pub mod edit;
pub mod error;
pub mod guard;
pub mod logging;
pub mod progress;
pub mod project;
pub mod session;
pub mod storage;
pub mod web;

pub use config::Config;
pub use donation::{resolve, LinkTable};
pub use error::{Error, Result};
pub use guard::AdminGuard;
pub use logging::init_logging;
pub use project::Project;
pub use session::{Session, SessionStore};
pub use storage::ProjectStore;
