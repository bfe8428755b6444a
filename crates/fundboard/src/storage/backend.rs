//! Persistence backends for the project collection.
//!
//! A backend knows how to load the whole collection and how to replace it
//! wholesale. There is no partial write: every save carries every record.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::project::{default_projects, Project};

/// Durable home of the project collection.
pub trait ProjectBackend: Send + Sync + fmt::Debug {
    /// Human-readable location, for logging.
    fn describe(&self) -> String;

    /// Load the persisted collection, seeding the defaults if nothing has
    /// been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium is unavailable or unreadable.
    fn load(&self) -> Result<Vec<Project>>;

    /// Replace the persisted collection with `projects`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection could not be written.
    fn save(&self, projects: &[Project]) -> Result<()>;
}

/// Pretty-printed JSON array on disk.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the target, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the given file. Nothing is touched until `load`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn ensure_directory(&self) -> Result<()> {
        let dir = self.directory();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProjectBackend for JsonFileBackend {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<Project>> {
        self.ensure_directory()?;

        match fs::read(&self.path) {
            Ok(bytes) => {
                let projects: Vec<Project> =
                    serde_json::from_slice(&bytes).map_err(|err| Error::StorageCorrupt {
                        path: self.path.clone(),
                        message: err.to_string(),
                    })?;
                debug!("Loaded {} projects from {}", projects.len(), self.path.display());
                Ok(projects)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let projects = default_projects();
                self.save(&projects)?;
                info!("Seeded {} default projects into {}", projects.len(), self.path.display());
                Ok(projects)
            }
            Err(source) => Err(Error::StorageRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, projects: &[Project]) -> Result<()> {
        self.ensure_directory()?;

        let mut file =
            NamedTempFile::new_in(self.directory()).map_err(|err| self.write_error(err))?;
        serde_json::to_writer_pretty(&mut file, projects)?;
        file.write_all(b"\n").map_err(|err| self.write_error(err))?;
        file.as_file().sync_all().map_err(|err| self.write_error(err))?;
        file.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;

        debug!("Saved {} projects to {}", projects.len(), self.path.display());
        Ok(())
    }
}

/// Process-local backend for tests and dry runs.
///
/// Counts saves and can be told to fail them, which makes write-through
/// behavior observable.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    persisted: Mutex<Option<Vec<Project>>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    /// An empty backend; the first `load` seeds the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that already holds `projects`.
    #[must_use]
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            persisted: Mutex::new(Some(projects)),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what has been persisted.
    #[must_use]
    pub fn persisted(&self) -> Option<Vec<Project>> {
        self.persisted.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ProjectBackend for MemoryBackend {
    fn describe(&self) -> String {
        ":memory:".to_string()
    }

    fn load(&self) -> Result<Vec<Project>> {
        let existing = self
            .persisted
            .lock()
            .map_err(|_| Error::internal("memory backend lock poisoned"))?
            .clone();

        if let Some(projects) = existing {
            return Ok(projects);
        }

        let projects = default_projects();
        self.save(&projects)?;
        Ok(projects)
    }

    fn save(&self, projects: &[Project]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::StorageWrite {
                path: PathBuf::from(":memory:"),
                source: std::io::Error::other("saves disabled"),
            });
        }

        let mut guard = self
            .persisted
            .lock()
            .map_err(|_| Error::internal("memory backend lock poisoned"))?;
        *guard = Some(projects.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
