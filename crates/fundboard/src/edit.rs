//! Admin edit workflow for a single project.
//!
//! Two steps: [`form_view`] shows the current record, [`apply_update`]
//! validates a submitted [`EditForm`] and writes it through the store. This
//! is the only way records change. Fields can be replaced but never blanked,
//! and projects cannot be added or removed here.

use serde::{Deserialize, Serialize};

use crate::donation::{resolve, LinkTable};
use crate::error::{Error, Result};
use crate::project::{parse_amount, Project};
use crate::storage::ProjectStore;

/// Message shown when `target` or `raised` does not parse.
pub const NUMBERS_REQUIRED: &str = "Target and Raised must be numbers.";

/// Raw edit form submission. Absent fields request no change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditForm {
    /// New title.
    pub title: Option<String>,
    /// New goal.
    pub target: Option<String>,
    /// New amount raised.
    pub raised: Option<String>,
    /// New link table key.
    pub donation_key: Option<String>,
    /// New per-project donation URL.
    pub donation_url: Option<String>,
}

/// A validated edit, ready to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    title: Option<String>,
    target: Option<i64>,
    raised: Option<i64>,
    donation_key: Option<String>,
    donation_url: Option<String>,
}

impl EditForm {
    /// Validate the submission.
    ///
    /// Text fields are trimmed; blank ones are ignored. Amounts accept
    /// decimals and are truncated to integers.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `target` or `raised` is present but not
    /// a number. Nothing is partially accepted.
    pub fn validate(&self) -> Result<ProjectUpdate> {
        let target = self.target.as_deref().map(parse_required_amount).transpose()?;
        let raised = self.raised.as_deref().map(parse_required_amount).transpose()?;

        Ok(ProjectUpdate {
            title: non_blank(self.title.as_deref()),
            target,
            raised,
            donation_key: non_blank(self.donation_key.as_deref()),
            donation_url: non_blank(self.donation_url.as_deref()),
        })
    }
}

impl ProjectUpdate {
    /// Write the requested changes into `project`.
    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(target) = self.target {
            project.target = target;
        }
        if let Some(raised) = self.raised {
            project.raised = raised;
        }
        if let Some(key) = self.donation_key {
            project.donation_key = Some(key);
        }
        if let Some(url) = self.donation_url {
            project.donation_url = Some(url);
        }
    }
}

fn parse_required_amount(raw: &str) -> Result<i64> {
    parse_amount(raw).ok_or_else(|| Error::validation(NUMBERS_REQUIRED))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// What the edit form shows for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditView {
    /// The stored record.
    pub project: Project,
    /// Where the donate button currently points.
    pub donate_url: String,
    /// Link table keys to choose from, sorted.
    pub donation_keys: Vec<String>,
}

/// Build the edit form for `slug`.
///
/// # Errors
///
/// Returns [`Error::ProjectNotFound`] if the slug is unknown.
pub fn form_view(store: &ProjectStore, links: &LinkTable, slug: &str) -> Result<EditView> {
    let project = store.find(slug)?;
    Ok(EditView {
        donate_url: resolve(&project, links),
        donation_keys: links.keys(),
        project,
    })
}

/// Validate `form` and apply it to `slug`, persisting the collection.
///
/// The slug is resolved before the form is validated, so an unknown slug is
/// always reported as not found.
///
/// # Errors
///
/// Returns [`Error::ProjectNotFound`] for an unknown slug, a validation error
/// for unparsable amounts, or a storage error if the save fails. The stored
/// record is unchanged in every error case.
pub fn apply_update(store: &ProjectStore, slug: &str, form: &EditForm) -> Result<Project> {
    store.update(slug, |project| {
        form.validate()?.apply(project);
        Ok(())
    })
}
