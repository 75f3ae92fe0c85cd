//! Configuration management for Sightline.
//!
//! Configuration is loaded from a platform config directory with sensible
//! defaults. All config structs implement `Default` so a missing file means
//! "run with defaults", not an error.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Sightline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture pipeline settings
    pub capture: CaptureConfig,

    /// Image cache settings
    pub cache: CacheConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// `~/.sightline/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "sightline", "sightline")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sightline").join("config.toml")
            })
    }

    /// Get the resolved cache root path (with ~ expansion).
    ///
    /// Falls back to the platform cache directory when no root is configured.
    pub fn cache_root(&self) -> PathBuf {
        match &self.cache.root {
            Some(root) => {
                let expanded = shellexpand::tilde(root);
                PathBuf::from(expanded.into_owned())
            }
            None => directories::ProjectDirs::from("dev", "sightline", "sightline")
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .unwrap_or_else(|| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                    PathBuf::from(home).join(".sightline").join("cache")
                }),
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.capture.target_width, 1080);
        assert_eq!(config.capture.jpeg_quality, 80);
        assert_eq!(config.cache.max_total_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[capture]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_cache_root_expands_tilde() {
        let mut config = Config::default();
        config.cache.root = Some("~/sightline-cache".to_string());
        let root = config.cache_root();
        assert!(!root.to_string_lossy().contains('~'));
        assert!(root.ends_with("sightline-cache"));
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture]\ntarget_width = 720\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.capture.target_width, 720);
        // Unspecified sections keep their defaults
        assert_eq!(config.cache.eviction_trigger_ratio, 0.8);
    }
}
