//! Application configuration for pixmill.
//!
//! Loaded from `config.toml` in the platform config directory, falling back to
//! defaults when the file is absent. This is the tool's own settings file; the
//! per-run transform parameters live in [`crate::Configuration`].

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for pixmill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Watermark rendering settings
    pub watermark: WatermarkConfig,

    /// Progress observer settings
    pub progress: ProgressConfig,

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
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.pixmill.pixmill/config.toml
    /// - Linux: ~/.config/pixmill/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pixmill\pixmill\config\config.toml
    ///
    /// Falls back to ~/.pixmill/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Default presets directory, next to the config file.
    pub fn default_presets_dir() -> PathBuf {
        Self::config_dir().join("presets")
    }

    fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "pixmill", "pixmill")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pixmill")
            })
    }

    /// Get the resolved presets directory (with ~ expansion).
    pub fn presets_dir(&self) -> PathBuf {
        expand(&self.general.presets_dir)
    }

    /// Get the resolved watermark font path (with ~ expansion), if configured.
    pub fn font_path(&self) -> Option<PathBuf> {
        self.watermark.font_path.as_deref().map(expand)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.progress.poll_interval_ms, 100);
        assert!(config.watermark.font_path.is_none());
        assert!(config.general.presets_dir.ends_with("presets"));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[limits]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[progress]\npoll_interval_ms = 250\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.progress.poll_interval_ms, 250);
        assert_eq!(config.limits.max_image_dimension, 20000);
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.general.presets_dir = PathBuf::from("~/presets");
        config.watermark.font_path = Some(PathBuf::from("~/fonts/mono.ttf"));

        assert!(!config.presets_dir().to_string_lossy().starts_with('~'));
        assert!(!config
            .font_path()
            .unwrap()
            .to_string_lossy()
            .starts_with('~'));
    }
}
