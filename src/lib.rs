//! # CNCSend
//!
//! Streams G-code to a CNC machine over a serial line, one command at a
//! time, waiting for the firmware's completion token before sending the
//! next.
//!
//! ## Architecture
//!
//! CNCSend is organized as a workspace with multiple crates:
//!
//! 1. **cncsend-core** - Error taxonomy, message levels and sinks
//! 2. **cncsend-communication** - Port discovery, connection lifecycle,
//!    command queue and the tick-driven streaming engine
//! 3. **cncsend-settings** - Configuration loading and validation
//! 4. **cncsend** - Operator console binary that integrates the crates

pub mod console;

use std::path::PathBuf;
use std::time::Duration;

pub use cncsend_communication::{
    list_ports, EngineConfig, EngineHandle, EngineIntent, LineSettings, ProjectFiles,
    ResponseClassifier, Sentinel, StreamingEngine, SystemPorts, TickScheduler,
};
pub use cncsend_core::{
    ConnectionError, Error, MessageLevel, MessageSink, Result, SentinelMatch, StreamError,
    TracingSink,
};
pub use cncsend_settings::{default_config_path, Config, LoggingSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - `RUST_LOG` environment variable support, falling back to the
///   configured level
/// - Console output, pretty or JSON lines
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", settings.level, e))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    tracing::info!("CNCSend {} (built {})", VERSION, BUILD_DATE);
    Ok(())
}

/// Load configuration
///
/// An explicit path must exist. Without one, the default location is used
/// if a file is there, otherwise built-in defaults apply.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from_file(&path)?),
        None => match default_config_path() {
            Some(path) if path.exists() => Ok(Config::load_from_file(&path)?),
            _ => Ok(Config::default()),
        },
    }
}

/// Engine configuration derived from the settings file
pub fn engine_config(config: &Config) -> EngineConfig {
    let streaming = &config.streaming;
    EngineConfig {
        line: LineSettings::with_read_timeout(Duration::from_millis(
            config.connection.read_timeout_ms,
        )),
        port_refresh_interval: Duration::from_millis(streaming.port_refresh_ms),
        sentinel: Sentinel::new(streaming.sentinel.clone(), streaming.sentinel_match),
        classifier: ResponseClassifier::new(streaming.attention_markers.iter().cloned()),
        max_queue_len: streaming.max_queue_len,
    }
}

/// Tick scheduler at the configured cadence
pub fn tick_scheduler(config: &Config) -> TickScheduler {
    TickScheduler::new(Duration::from_millis(config.streaming.tick_interval_ms))
}
