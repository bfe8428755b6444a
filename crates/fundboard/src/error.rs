//! Error types for fundboard.
//!
//! This module defines all error types used throughout the fundboard crate,
//! providing detailed context for debugging and user-facing messages for the
//! admin and contact forms.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fundboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Project Errors ===
    /// No project exists with the given slug.
    #[error("project not found: {slug}")]
    ProjectNotFound {
        /// The slug that failed to resolve.
        slug: String,
    },

    /// Submitted form values could not be accepted.
    #[error("validation failed: {message}")]
    Validation {
        /// User-facing description of the problem.
        message: String,
    },

    // === Session Errors ===
    /// Login attempt did not match the configured admin credential.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A privileged route was requested without a privileged session.
    #[error("login required to access {next}")]
    LoginRequired {
        /// Path the caller should be returned to after logging in.
        next: String,
    },

    // === Storage Errors ===
    /// Failed to read a persisted file.
    #[error("failed to read {path}: {source}")]
    StorageRead {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a persisted file.
    #[error("failed to write {path}: {source}")]
    StorageWrite {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted file was readable but its contents are unusable.
    #[error("corrupt data in {path}: {message}")]
    StorageCorrupt {
        /// Path of the file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV record could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fundboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a project-not-found error.
    #[must_use]
    pub fn not_found(slug: impl Into<String>) -> Self {
        Self::ProjectNotFound { slug: slug.into() }
    }

    /// Create a validation error with a user-facing message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a login-required error remembering where the caller was headed.
    #[must_use]
    pub fn login_required(next: impl Into<String>) -> Self {
        Self::LoginRequired { next: next.into() }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the slug did not resolve.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound { .. })
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is a storage-layer failure.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageRead { .. }
                | Self::StorageWrite { .. }
                | Self::StorageCorrupt { .. }
                | Self::DirectoryCreate { .. }
                | Self::Io(_)
                | Self::Json(_)
                | Self::Csv(_)
        )
    }
}
