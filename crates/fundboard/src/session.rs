//! Per-visitor session state.
//!
//! A [`Session`] is a plain value: handlers receive it, change it, and hand
//! it back to the [`SessionStore`]. Sessions live in process memory only.
//! Privileged sessions never expire; anonymous ones are bounded in number.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// Something worked.
    Success,
    /// Something was rejected.
    Error,
}

/// A one-shot message shown on the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    /// Severity.
    pub level: FlashLevel,
    /// Text for the visitor.
    pub message: String,
}

/// State attached to one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    privileged: bool,
    admin_identifier: Option<String>,
    flashes: Vec<Flash>,
}

impl Session {
    /// A fresh anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the admin has logged in on this session.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// The identifier the admin logged in with.
    #[must_use]
    pub fn admin_identifier(&self) -> Option<&str> {
        self.admin_identifier.as_deref()
    }

    /// Mark the session privileged for `identifier`.
    pub(crate) fn grant(&mut self, identifier: impl Into<String>) {
        self.privileged = true;
        self.admin_identifier = Some(identifier.into());
    }

    /// Drop everything, flashes included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Queue a message for the next page view.
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Take all queued messages, leaving none behind.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

/// Most anonymous sessions kept at once.
///
/// Anonymous sessions only carry flash messages, so once the limit is hit
/// the least recently touched ones are dropped. Privileged sessions are never
/// evicted.
pub const MAX_ANONYMOUS_SESSIONS: usize = 1024;

#[derive(Debug)]
struct Entry {
    session: Session,
    touched: u64,
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<Uuid, Entry>,
    clock: u64,
}

/// In-memory table of sessions keyed by an opaque random token.
#[derive(Debug)]
pub struct SessionStore {
    table: Mutex<Table>,
    anonymous_limit: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_anonymous_limit(MAX_ANONYMOUS_SESSIONS)
    }
}

impl SessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store keeping at most `limit` anonymous sessions.
    #[must_use]
    pub fn with_anonymous_limit(limit: usize) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            anonymous_limit: limit,
        }
    }

    /// Mint a new, unguessable token.
    #[must_use]
    pub fn new_token() -> Uuid {
        Uuid::new_v4()
    }

    /// Fetch the session stored under `token`, if this store issued it and
    /// still holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn get(&self, token: &Uuid) -> Result<Option<Session>> {
        Ok(self
            .lock()?
            .entries
            .get(token)
            .map(|entry| entry.session.clone()))
    }

    /// Store `session` under `token`. An empty session is dropped instead.
    ///
    /// Saving an anonymous session may evict the least recently touched
    /// anonymous sessions to stay within the limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn save(&self, token: Uuid, session: Session) -> Result<()> {
        let mut table = self.lock()?;
        if session == Session::default() {
            table.entries.remove(&token);
            return Ok(());
        }

        let anonymous = !session.is_privileged();
        table.clock += 1;
        let touched = table.clock;
        table.entries.insert(token, Entry { session, touched });

        if anonymous {
            self.evict_anonymous(&mut table);
        }
        Ok(())
    }

    /// Forget the session stored under `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn remove(&self, token: &Uuid) -> Result<()> {
        self.lock()?.entries.remove(token);
        Ok(())
    }

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.entries.len())
    }

    /// Whether no sessions are held.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.entries.is_empty())
    }

    fn evict_anonymous(&self, table: &mut Table) {
        let mut anonymous: Vec<(u64, Uuid)> = table
            .entries
            .iter()
            .filter(|(_, entry)| !entry.session.is_privileged())
            .map(|(token, entry)| (entry.touched, *token))
            .collect();
        if anonymous.len() <= self.anonymous_limit {
            return;
        }

        anonymous.sort_unstable();
        let excess = anonymous.len() - self.anonymous_limit;
        for (_, token) in anonymous.into_iter().take(excess) {
            table.entries.remove(&token);
        }
        debug!("Evicted {} idle anonymous sessions", excess);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>> {
        self.table
            .lock()
            .map_err(|_| Error::internal("session store lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_anonymous() {
        let session = Session::new();
        assert!(!session.is_privileged());
        assert!(session.admin_identifier().is_none());
    }

    #[test]
    fn test_grant_and_clear() {
        let mut session = Session::new();
        session.grant("admin@example.com");
        session.flash(FlashLevel::Success, "Welcome, admin.");
        assert!(session.is_privileged());
        assert_eq!(session.admin_identifier(), Some("admin@example.com"));

        session.clear();
        assert_eq!(session, Session::default());

        // Clearing twice is harmless
        session.clear();
        assert!(!session.is_privileged());
    }

    #[test]
    fn test_flashes_are_taken_once() {
        let mut session = Session::new();
        session.flash(FlashLevel::Error, "Invalid credentials.");

        let flashes = session.take_flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].level, FlashLevel::Error);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_flash_level_serializes_lowercase() {
        let flash = Flash {
            level: FlashLevel::Success,
            message: "ok".to_string(),
        };
        let json = serde_json::to_string(&flash).unwrap();
        assert_eq!(json, r#"{"level":"success","message":"ok"}"#);
    }

    #[test]
    fn test_store_roundtrip() {
        let store = SessionStore::new();
        let token = SessionStore::new_token();
        assert!(store.get(&token).unwrap().is_none());

        let mut session = Session::new();
        session.grant("admin@example.com");
        store.save(token, session.clone()).unwrap();
        assert_eq!(store.get(&token).unwrap(), Some(session));
        assert_eq!(store.len().unwrap(), 1);

        store.remove(&token).unwrap();
        assert!(store.get(&token).unwrap().is_none());
    }

    #[test]
    fn test_store_drops_empty_sessions() {
        let store = SessionStore::new();
        let token = SessionStore::new_token();

        let mut session = Session::new();
        session.grant("admin@example.com");
        store.save(token, session.clone()).unwrap();

        session.clear();
        store.save(token, session).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_anonymous_sessions_are_bounded() {
        let store = SessionStore::with_anonymous_limit(3);
        let tokens: Vec<Uuid> = (0..5).map(|_| SessionStore::new_token()).collect();

        for token in &tokens {
            let mut session = Session::new();
            session.flash(FlashLevel::Error, "Invalid credentials.");
            store.save(*token, session).unwrap();
        }

        assert_eq!(store.len().unwrap(), 3);
        assert!(store.get(&tokens[0]).unwrap().is_none());
        assert!(store.get(&tokens[1]).unwrap().is_none());
        assert!(store.get(&tokens[4]).unwrap().is_some());
    }

    #[test]
    fn test_recently_touched_session_survives_eviction() {
        let store = SessionStore::with_anonymous_limit(2);
        let first = SessionStore::new_token();
        let mut session = Session::new();
        session.flash(FlashLevel::Success, "Signed out.");

        store.save(first, session.clone()).unwrap();
        store.save(SessionStore::new_token(), session.clone()).unwrap();
        store.save(first, session.clone()).unwrap();
        store.save(SessionStore::new_token(), session).unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&first).unwrap().is_some());
    }

    #[test]
    fn test_privileged_sessions_are_never_evicted() {
        let store = SessionStore::with_anonymous_limit(1);
        let admin = SessionStore::new_token();
        let mut privileged = Session::new();
        privileged.grant("admin@example.com");
        store.save(admin, privileged).unwrap();

        for _ in 0..4 {
            let mut session = Session::new();
            session.flash(FlashLevel::Error, "Invalid credentials.");
            store.save(SessionStore::new_token(), session).unwrap();
        }

        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&admin).unwrap().unwrap().is_privileged());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(SessionStore::new_token(), SessionStore::new_token());
    }
}
