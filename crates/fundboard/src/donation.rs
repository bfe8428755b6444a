//! Outbound donation links.
//!
//! Every project points at a checkout page either directly, through its own
//! `donation_url`, or indirectly, through a short key in the shared
//! [`LinkTable`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::project::Project;

/// Read-only mapping from short donation key to checkout URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTable(BTreeMap<String, String>);

impl LinkTable {
    /// Create a link table from an existing map.
    #[must_use]
    pub fn new(links: BTreeMap<String, String>) -> Self {
        Self(links)
    }

    /// Look up the URL for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// All known keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Iterate over `(key, url)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for LinkTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve the donation URL for a project.
///
/// A non-empty per-project override wins outright. Otherwise the project's
/// key is looked up in `links`; an unset or unknown key yields `""`.
#[must_use]
pub fn resolve(project: &Project, links: &LinkTable) -> String {
    if let Some(url) = project.donation_url.as_deref().filter(|url| !url.is_empty()) {
        return url.to_string();
    }

    project
        .donation_key
        .as_deref()
        .and_then(|key| links.get(key))
        .unwrap_or_default()
        .to_string()
}
