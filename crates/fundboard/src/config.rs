//! Configuration management for fundboard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::donation::LinkTable;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fundboard";

/// Project collection file name inside the data directory.
const PROJECTS_FILE_NAME: &str = "projects.json";

/// Contact submissions file name inside the data directory.
const CONTACTS_FILE_NAME: &str = "contact_submissions.csv";

/// Admin password shipped in the defaults. Never fit for production.
pub const DEFAULT_ADMIN_PASSWORD: &str = "changeme";

/// Placeholder used for every default donation link.
const PLACEHOLDER_LINK: &str = "https://YOUR_GIVEBUTTER_OR_STRIPE_LINK";

/// Allowed shape of a donation link key.
const LINK_KEY_PATTERN: &str = r"^[a-z0-9][a-z0-9_-]*$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FUNDBOARD_`, nested with `__`)
/// 2. TOML config file at `~/.config/fundboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Admin credential.
    pub admin: AdminConfig,
    /// Donation link table.
    pub donation: DonationConfig,
    /// Organization details shown on public pages.
    pub organization: OrganizationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `projects.json` and `contact_submissions.csv`.
    /// Defaults to `~/.local/share/fundboard`
    pub data_dir: Option<PathBuf>,
}

/// The single admin credential.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin identifier, matched case-insensitively.
    pub user: String,
    /// Admin password, matched exactly. Never serialized back out.
    #[serde(skip_serializing)]
    pub password: String,
}

/// Donation link configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationConfig {
    /// Short key to checkout URL.
    pub links: BTreeMap<String, String>,
}

/// Organization details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    /// Display name.
    pub name: String,
    /// Public contact address.
    pub email: String,
    /// Employer identification number.
    pub ein: String,
    /// Mailing address, one line per entry.
    pub mailing: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            user: "admin@example.com".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

// Keep the password out of logs and `config show`.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            links: default_links(),
        }
    }
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "Providence Foundation".to_string(),
            email: "info@providencefoundation.org".to_string(),
            ein: "XX-XXXXXXX".to_string(),
            mailing: vec![
                "Providence Foundation".to_string(),
                "1234 Classic Ave.".to_string(),
                "Tulsa, OK 74137".to_string(),
            ],
        }
    }
}

/// Default donation link table.
fn default_links() -> BTreeMap<String, String> {
    [
        "pilots",
        "teachers",
        "houses",
        "innovation",
        "scholarships",
        "fifth",
    ]
    .into_iter()
    .map(|key| (key.to_string(), PLACEHOLDER_LINK.to_string()))
    .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FUNDBOARD_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FUNDBOARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.admin.user.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "admin.user must not be empty".to_string(),
            });
        }

        if self.admin.password.is_empty() {
            return Err(Error::ConfigValidation {
                message: "admin.password must not be empty".to_string(),
            });
        }

        let key_pattern = Regex::new(LINK_KEY_PATTERN)
            .map_err(|e| Error::internal(format!("bad link key pattern: {e}")))?;
        for (key, url) in &self.donation.links {
            if !key_pattern.is_match(key) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid donation link key: {key}"),
                });
            }
            if url.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("donation link '{key}' has an empty URL"),
                });
            }
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Path of the persisted project collection.
    #[must_use]
    pub fn projects_path(&self) -> PathBuf {
        self.data_dir().join(PROJECTS_FILE_NAME)
    }

    /// Path of the contact submissions log.
    #[must_use]
    pub fn contacts_path(&self) -> PathBuf {
        self.data_dir().join(CONTACTS_FILE_NAME)
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The configured donation links as a lookup table.
    #[must_use]
    pub fn link_table(&self) -> LinkTable {
        LinkTable::new(self.donation.links.clone())
    }

    /// Whether the shipped default password is still in use.
    #[must_use]
    pub fn uses_default_password(&self) -> bool {
        self.admin.password == DEFAULT_ADMIN_PASSWORD
    }
}
