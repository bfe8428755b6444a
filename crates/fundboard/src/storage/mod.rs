//! Storage layer for fundboard.
//!
//! [`ProjectStore`] owns the in-memory project collection and keeps it in
//! lockstep with a [`ProjectBackend`]. Every mutation runs find, modify and
//! persist under one lock, and the in-memory copy only changes once the
//! backend has accepted the new collection.

pub mod backend;

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::project::Project;

pub use backend::{JsonFileBackend, MemoryBackend, ProjectBackend};

/// Single source of truth for the project collection.
#[derive(Debug)]
pub struct ProjectStore {
    /// Where the collection is persisted.
    backend: Arc<dyn ProjectBackend>,
    /// The live collection, identical to the last successful save.
    projects: Mutex<Vec<Project>>,
}

impl ProjectStore {
    /// Load the collection from `backend` and take ownership of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot load, or if the loaded
    /// collection repeats a slug.
    pub fn open(backend: Arc<dyn ProjectBackend>) -> Result<Self> {
        let projects = backend.load()?;

        if let Some(slug) = first_duplicate_slug(&projects) {
            return Err(Error::StorageCorrupt {
                path: backend.describe().into(),
                message: format!("duplicate slug '{slug}'"),
            });
        }

        info!(
            "Project store opened with {} projects from {}",
            projects.len(),
            backend.describe()
        );
        Ok(Self {
            backend,
            projects: Mutex::new(projects),
        })
    }

    /// Open a store backed by a JSON file, seeding it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be read or parsed.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Arc::new(JsonFileBackend::new(path.as_ref())))
    }

    /// Create a store holding the default projects in memory.
    ///
    /// # Errors
    ///
    /// Returns an error only if the in-memory backend is poisoned.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Arc::new(MemoryBackend::new()))
    }

    /// Snapshot of every project, in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn all(&self) -> Result<Vec<Project>> {
        Ok(self.lock()?.clone())
    }

    /// Number of projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether the collection is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Look up a project by slug.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if no project has this slug.
    pub fn find(&self, slug: &str) -> Result<Project> {
        let projects = self.lock()?;
        position(&projects, slug)
            .map(|index| projects[index].clone())
            .ok_or_else(|| Error::not_found(slug))
    }

    /// Replace the whole collection and persist it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `projects` repeats a slug, or the
    /// backend's error if the save fails. The store is unchanged on error.
    pub fn replace_all(&self, projects: Vec<Project>) -> Result<()> {
        if let Some(slug) = first_duplicate_slug(&projects) {
            return Err(Error::validation(format!("duplicate slug '{slug}'")));
        }

        let mut current = self.lock()?;
        self.backend.save(&projects)?;
        *current = projects;
        debug!("Replaced project collection ({} projects)", current.len());
        Ok(())
    }

    /// Apply `edit` to the project with this slug and persist the result.
    ///
    /// The lookup, the edit and the save happen under one lock. `edit` works
    /// on a copy; if it fails, or the save fails, nothing changes. The slug
    /// is restored after `edit` runs so it cannot be rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] before calling `edit` if the slug is
    /// unknown, otherwise whatever `edit` or the backend returns.
    pub fn update<F>(&self, slug: &str, edit: F) -> Result<Project>
    where
        F: FnOnce(&mut Project) -> Result<()>,
    {
        let mut projects = self.lock()?;
        let index = position(&projects, slug).ok_or_else(|| Error::not_found(slug))?;

        let mut updated = projects[index].clone();
        edit(&mut updated)?;
        updated.slug.clone_from(&projects[index].slug);

        let mut next = projects.clone();
        next[index] = updated.clone();

        if let Err(err) = self.backend.save(&next) {
            warn!("Failed to persist update to '{}': {}", slug, err);
            return Err(err);
        }

        *projects = next;
        info!("Updated project '{}'", slug);
        Ok(updated)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Project>>> {
        self.projects
            .lock()
            .map_err(|_| Error::internal("project store lock poisoned"))
    }
}

fn position(projects: &[Project], slug: &str) -> Option<usize> {
    projects.iter().position(|project| project.slug == slug)
}

fn first_duplicate_slug(projects: &[Project]) -> Option<&str> {
    let mut seen = HashSet::new();
    projects
        .iter()
        .map(|project| project.slug.as_str())
        .find(|slug| !seen.insert(*slug))
}
