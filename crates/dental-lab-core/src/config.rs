//! Configuration file handling.
//!
//! Settings are read from `.dental-lab.toml`. Every field has a default, so an
//! empty or partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".dental-lab.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub lab: LabConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub entry: EntryConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Lab identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabConfig {
    /// Shown in the report title.
    #[serde(default = "default_lab_name")]
    pub name: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            name: default_lab_name(),
        }
    }
}

fn default_lab_name() -> String {
    crate::export::DEFAULT_LAB_NAME.to_string()
}

/// Where cases are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "dental-lab.db".to_string()
}

/// Case entry limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryConfig {
    /// Largest accepted photo, in decoded bytes.
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: usize,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            max_photo_bytes: default_max_photo_bytes(),
        }
    }
}

fn default_max_photo_bytes() -> usize {
    1024 * 1024 // 1MB
}

/// Owner sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Hex SHA-256 of the owner password. Owner login is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_password_sha256: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> ConfigResult<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
