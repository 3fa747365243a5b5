//! Application configuration module for personal-memory
//!
//! Provides TOML-based configuration with environment variable override support.
//! Priority: CLI args > Environment variables > Config file > Defaults

use super::path_resolver;
use crate::storage::{StorageKind, StorageOptions};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage backend: file, memory, or database (default: database)
    #[serde(default = "default_storage")]
    storage: String,

    /// JSON file used by the file backend
    #[serde(default)]
    file_path: Option<String>,

    /// Database file used by the database backend
    #[serde(default)]
    db_path: Option<String>,
}

fn default_storage() -> String {
    StorageKind::default().to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            file_path: None,
            db_path: None,
        }
    }
}

impl AppConfig {
    /// Create config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Load the default config file if it exists, otherwise defaults
    pub fn load_default() -> Result<Self> {
        let path = path_resolver::default_config_path();
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(storage) = std::env::var("PERSONAL_MEMORY_STORAGE") {
            config.storage = storage;
        }

        if let Ok(path) = std::env::var("PERSONAL_MEMORY_FILE_PATH") {
            config.file_path = Some(path);
        }

        if let Ok(path) = std::env::var("PERSONAL_MEMORY_DB_PATH") {
            config.db_path = Some(path);
        }

        config
    }

    /// Merge with another config (other takes priority for non-default values)
    pub fn merge_with(&self, other: &Self) -> Self {
        Self {
            storage: if other.storage != default_storage() {
                other.storage.clone()
            } else {
                self.storage.clone()
            },
            file_path: other.file_path.clone().or_else(|| self.file_path.clone()),
            db_path: other.db_path.clone().or_else(|| self.db_path.clone()),
        }
    }

    /// Override the storage backend
    pub fn with_storage(mut self, storage: &str) -> Self {
        self.storage = storage.to_string();
        self
    }

    /// Override the file backend path
    pub fn with_file_path(mut self, path: &str) -> Self {
        self.file_path = Some(path.to_string());
        self
    }

    /// Override the database path
    pub fn with_db_path(mut self, path: &str) -> Self {
        self.db_path = Some(path.to_string());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.storage_kind().map(|_| ())
    }

    /// Parsed storage backend
    pub fn storage_kind(&self) -> Result<StorageKind> {
        self.storage.parse().map_err(|e: String| anyhow!(e))
    }

    /// Backend locations with `~` and relative paths resolved
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            file_path: self.file_path.as_deref().map(resolve),
            db_path: self.db_path.as_deref().map(resolve),
        }
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize config: {}", e))
    }

    // Getters
    pub fn storage(&self) -> &str {
        &self.storage
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn db_path(&self) -> Option<&str> {
        self.db_path.as_deref()
    }
}

fn resolve(path: &str) -> std::path::PathBuf {
    path_resolver::resolve_path(path).unwrap_or_else(|_| path.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage(), "database");
        assert_eq!(config.file_path(), None);
        assert_eq!(config.db_path(), None);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_storage() {
        let config = AppConfig::default().with_storage("redis");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_kind() {
        let config = AppConfig::default().with_storage("memory");
        assert_eq!(config.storage_kind().unwrap(), StorageKind::Memory);
    }

    #[test]
    fn test_storage_options_resolve_paths() {
        let config = AppConfig::default()
            .with_file_path("/tmp/notes.json")
            .with_db_path("relative/notes.db");
        let options = config.storage_options();

        assert_eq!(
            options.file_path.unwrap().to_str().unwrap(),
            "/tmp/notes.json"
        );
        assert!(options.db_path.unwrap().is_absolute());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default().with_file_path("/tmp/notes.json");
        let toml = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
