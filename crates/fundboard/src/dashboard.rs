//! Public fundraising dashboard.
//!
//! Read-only: store, then progress, then donation link, then view.

use serde::Serialize;

use crate::donation::{resolve, LinkTable};
use crate::error::Result;
use crate::project::Project;
use crate::storage::ProjectStore;

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectView {
    /// Project slug.
    pub slug: String,
    /// Project title.
    pub title: String,
    /// Goal, at least 1.
    pub target: i64,
    /// Amount raised, at least 0.
    pub raised: i64,
    /// Progress in `0..=100`.
    pub percent: u8,
    /// Donate button target; empty when no link is configured.
    pub donate_url: String,
}

impl ProjectView {
    /// Build the view of one project.
    #[must_use]
    pub fn new(project: &Project, links: &LinkTable) -> Self {
        Self {
            slug: project.slug.clone(),
            title: project.title.clone(),
            target: project.target.max(1),
            raised: project.raised.max(0),
            percent: project.percent(),
            donate_url: resolve(project, links),
        }
    }
}

/// Views of every project, in stored order.
///
/// # Errors
///
/// Returns an error if the store lock is poisoned.
pub fn project_views(store: &ProjectStore, links: &LinkTable) -> Result<Vec<ProjectView>> {
    Ok(store
        .all()?
        .iter()
        .map(|project| ProjectView::new(project, links))
        .collect())
}
