//! Configuration for CNCSend
//!
//! Supports JSON and TOML files, chosen by extension. Every section and
//! field has a default, so a partial file is valid.
//!
//! Configuration is organized into sections:
//! - Connection settings (read timeout; line parameters are fixed)
//! - Streaming settings (tick cadence, sentinel, queue bound)
//! - File settings (project root for command files)
//! - Logging settings

use crate::error::{SettingsError, SettingsResult};
use cncsend_core::SentinelMatch;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config dir
const APP_DIR: &str = "cncsend";

/// Default config file name
const CONFIG_FILE: &str = "config.toml";

/// Default location of the config file, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: 20,
        }
    }
}

/// Streaming settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Scheduler tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Minimum time between port scans while no port is found
    pub port_refresh_ms: u64,
    /// Completion token sent by the firmware
    pub sentinel: String,
    /// How the completion token is matched
    pub sentinel_match: SentinelMatch,
    /// Substrings that flag a reply for attention
    pub attention_markers: Vec<String>,
    /// Queue capacity; unbounded when absent
    pub max_queue_len: Option<usize>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            port_refresh_ms: 500,
            sentinel: "DONE".to_string(),
            sentinel_match: SentinelMatch::default(),
            attention_markers: vec!["DEBOUNCE".to_string(), "{".to_string(), "<".to_string()],
            max_queue_len: None,
        }
    }
}

/// Command file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Directory command file names are resolved against
    pub project_root: PathBuf,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Streaming settings
    pub streaming: StreamingSettings,
    /// File settings
    pub files: FileSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Config {
    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("none").to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("none").to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("{}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if !(1..=1000).contains(&self.connection.read_timeout_ms) {
            return Err(SettingsError::invalid(
                "connection.read_timeout_ms",
                "must be between 1 and 1000",
            ));
        }

        if !(10..=5000).contains(&self.streaming.tick_interval_ms) {
            return Err(SettingsError::invalid(
                "streaming.tick_interval_ms",
                "must be between 10 and 5000",
            ));
        }

        if self.streaming.port_refresh_ms == 0 {
            return Err(SettingsError::invalid(
                "streaming.port_refresh_ms",
                "must be > 0",
            ));
        }

        if self.streaming.sentinel.trim().is_empty() {
            return Err(SettingsError::invalid(
                "streaming.sentinel",
                "must not be empty",
            ));
        }

        if self.streaming.max_queue_len == Some(0) {
            return Err(SettingsError::invalid(
                "streaming.max_queue_len",
                "must be > 0 when set",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::invalid("logging.level", "must not be empty"));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.streaming.sentinel, "DONE");
        assert_eq!(config.streaming.sentinel_match, SentinelMatch::Substring);
        assert_eq!(config.connection.read_timeout_ms, 20);
        assert!(config.streaming.max_queue_len.is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.connection.read_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.streaming.sentinel = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { ref key, .. }) if key == "streaming.sentinel"
        ));

        let mut config = Config::default();
        config.streaming.max_queue_len = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.streaming.tick_interval_ms = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [streaming]
            sentinel_match = "line"
            max_queue_len = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.streaming.sentinel_match, SentinelMatch::Line);
        assert_eq!(config.streaming.max_queue_len, Some(500));
        assert_eq!(config.streaming.tick_interval_ms, 100);
        assert_eq!(config.files.project_root, PathBuf::from("."));
    }

    #[test]
    fn test_default_path_is_under_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("cncsend/config.toml"));
        }
    }
}
