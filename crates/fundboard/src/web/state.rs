//! Shared handler state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, OrganizationConfig};
use crate::contact::ContactLog;
use crate::donation::LinkTable;
use crate::error::Result;
use crate::guard::AdminGuard;
use crate::session::SessionStore;
use crate::storage::ProjectStore;

/// Everything a handler may touch, injected through axum's `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The project collection.
    pub store: Arc<ProjectStore>,
    /// Shared donation links.
    pub links: Arc<LinkTable>,
    /// Admin credential check.
    pub guard: Arc<AdminGuard>,
    /// Visitor sessions.
    pub sessions: Arc<SessionStore>,
    /// Contact form log.
    pub contacts: Arc<ContactLog>,
    /// Organization details for public pages.
    pub organization: Arc<OrganizationConfig>,
}

impl AppState {
    /// Assemble state around an already opened store.
    #[must_use]
    pub fn new(store: ProjectStore, contacts: ContactLog, config: &Config) -> Self {
        let links = config.link_table();
        if links.is_empty() {
            warn!("No donation links configured; donate buttons will be empty");
        } else {
            debug!("Loaded {} donation links", links.len());
        }

        Self {
            store: Arc::new(store),
            links: Arc::new(links),
            guard: Arc::new(AdminGuard::from_config(&config.admin)),
            sessions: Arc::new(SessionStore::new()),
            contacts: Arc::new(contacts),
            organization: Arc::new(config.organization.clone()),
        }
    }

    /// Open the data files named by `config` and assemble state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the project file cannot be loaded or seeded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ProjectStore::open_file(config.projects_path())?;
        let contacts = ContactLog::new(config.contacts_path());
        Ok(Self::new(store, contacts, config))
    }
}
