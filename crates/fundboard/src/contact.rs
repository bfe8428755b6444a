//! Contact form submissions.
//!
//! Accepted messages are appended to a CSV file. The header row is written
//! when the file is first created; existing rows are never rewritten.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// Message shown when a required field is blank.
pub const FIELDS_REQUIRED: &str = "Please fill out name, email, and message.";

/// Column names of the submissions file.
pub const HEADER: [&str; 4] = ["timestamp", "name", "email", "message"];

/// A contact form submission as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// Sender's name.
    pub name: String,
    /// Sender's email address.
    pub email: String,
    /// Message body.
    pub message: String,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    /// When the message was accepted.
    pub received_at: DateTime<Utc>,
    /// Sender's name, trimmed.
    pub name: String,
    /// Sender's email address, trimmed.
    pub email: String,
    /// Message body, trimmed.
    pub message: String,
}

impl ContactForm {
    /// Trim every field and stamp the submission.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is blank.
    pub fn validate(&self) -> Result<ContactMessage> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(Error::validation(FIELDS_REQUIRED));
        }

        Ok(ContactMessage {
            received_at: Utc::now(),
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
    }
}

/// Append-only CSV log of contact messages.
#[derive(Debug)]
pub struct ContactLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ContactLog {
    /// Create a log writing to `path`. The file is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the CSV file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one message, writing the header first if the file is new.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn append(&self, entry: &ContactMessage) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::internal("contact log lock poisoned"))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::StorageWrite {
                path: self.path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            entry.received_at.to_rfc3339_opts(SecondsFormat::Micros, true).as_str(),
            entry.name.as_str(),
            entry.email.as_str(),
            entry.message.as_str(),
        ])?;
        writer.flush()?;

        info!("Recorded contact message from {}", entry.email);
        Ok(())
    }

    /// Validate `form` and append it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or a storage error if the
    /// log cannot be written.
    pub fn submit(&self, form: &ContactForm) -> Result<ContactMessage> {
        let entry = form.validate()?;
        self.append(&entry)?;
        Ok(entry)
    }
}
