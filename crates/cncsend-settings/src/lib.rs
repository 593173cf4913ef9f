//! CNCSend Settings Crate
//!
//! Handles application configuration: loading, saving, and validating the
//! streamer's settings file.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, ConnectionSettings, FileSettings, LoggingSettings,
    StreamingSettings,
};
pub use error::{SettingsError, SettingsResult};
