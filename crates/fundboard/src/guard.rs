//! Admin session guard.
//!
//! One shared credential, checked at login and remembered in the session.
//! There is no expiry, no rate limiting and no lockout: anyone holding the
//! password is the admin for as long as their session lives.

use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::error::{Error, Result};
use crate::session::Session;

/// Path privileged visitors land on when no destination was requested.
pub const ADMIN_HOME: &str = "/admin";

/// Checks the admin credential and gates privileged routes.
pub struct AdminGuard {
    identifier: String,
    password_digest: blake3::Hash,
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

impl AdminGuard {
    /// Create a guard for the given identifier and password.
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: &str) -> Self {
        Self {
            identifier: identifier.into(),
            password_digest: blake3::hash(password.as_bytes()),
        }
    }

    /// Create a guard from the `[admin]` configuration section.
    #[must_use]
    pub fn from_config(admin: &AdminConfig) -> Self {
        Self::new(admin.user.clone(), &admin.password)
    }

    /// Attempt to log in on `session`.
    ///
    /// The identifier is trimmed and compared case-insensitively; the
    /// password must match exactly. The comparison of digests runs in
    /// constant time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on any mismatch. The session is
    /// left unprivileged in that case.
    pub fn login(&self, session: &mut Session, identifier: &str, password: &str) -> Result<()> {
        let identifier = identifier.trim();
        let identifier_ok = identifier.to_lowercase() == self.identifier.to_lowercase();
        let password_ok = blake3::hash(password.as_bytes()) == self.password_digest;

        if identifier_ok && password_ok {
            session.grant(identifier);
            info!("Admin logged in as {}", identifier);
            Ok(())
        } else {
            warn!("Rejected admin login attempt");
            Err(Error::InvalidCredentials)
        }
    }

    /// Clear all session state. Safe to call on an anonymous session.
    pub fn logout(&self, session: &mut Session) {
        if session.is_privileged() {
            info!("Admin logged out");
        }
        session.clear();
    }

    /// Whether `session` was granted privilege for this guard's identifier.
    #[must_use]
    pub fn is_admin(&self, session: &Session) -> bool {
        session.is_privileged()
            && session
                .admin_identifier()
                .is_some_and(|id| id.to_lowercase() == self.identifier.to_lowercase())
    }

    /// Allow the admin's sessions through.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoginRequired`] carrying `destination` so the caller
    /// can come back after logging in.
    pub fn require_privileged(&self, session: &Session, destination: &str) -> Result<()> {
        if self.is_admin(session) {
            Ok(())
        } else {
            Err(Error::login_required(destination))
        }
    }
}

/// Where to send a visitor after a successful login.
///
/// Only local absolute paths are honored, so a crafted `next` cannot bounce
/// the admin to another site.
#[must_use]
pub fn post_login_destination(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => ADMIN_HOME,
    }
}
