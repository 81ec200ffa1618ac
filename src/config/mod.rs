//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::aggregate::{AggregatorOptions, PLAYER_STATS_COLLECTION};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which document store backs career statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Jsonl,
    Memory,
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_stats_collection")]
    pub stats_collection: String,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Jsonl
}

fn default_timeout() -> u64 {
    30
}

fn default_stats_collection() -> String {
    PLAYER_STATS_COLLECTION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout_seconds: default_timeout(),
            stats_collection: default_stats_collection(),
        }
    }
}

impl StoreConfig {
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            collection: self.stats_collection.clone(),
            store_timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Store timeout must be greater than 0".to_string(),
            ));
        }

        if self.store.stats_collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Stats collection name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.store.backend, StoreBackend::Jsonl);
        assert_eq!(config.store.timeout_seconds, 30);
        assert_eq!(config.store.stats_collection, "playerStats");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.timeout_seconds, 30);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[store]\nbackend = \"firestore\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.store.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_collection() {
        let mut config = AppConfig::default();
        config.store.stats_collection = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aggregator_options_from_store_config() {
        let options = StoreConfig::default().aggregator_options();
        assert_eq!(options.collection, "playerStats");
        assert_eq!(options.store_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        assert_eq!(
            AppConfig::load_or_default(&missing).unwrap().log_level,
            "info"
        );

        let path = temp_dir.path().join("cricket.toml");
        std::fs::write(&path, "[store]\ntimeout_seconds = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_or_default(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.store.backend, parsed.store.backend);
    }
}
