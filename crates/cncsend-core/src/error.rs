//! Error handling for CNCSend
//!
//! Provides error types for the layers of the streamer:
//! - Connection errors (port selection, open, line loss)
//! - Stream errors (file loading, queue admission)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! None of them is fatal to the tick loop; callers log and carry on.

use thiserror::Error;

/// Connection error type
///
/// Represents errors related to the serial connection lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No enumerated port matches the selected index
    #[error("No port available at index {index} ({available} enumerated)")]
    PortUnavailable {
        /// The selected index.
        index: usize,
        /// How many ports were enumerated.
        available: usize,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// The port opened but the control lines could not be asserted
    #[error("Failed to assert DTR/RTS on {port}: {reason}")]
    ControlLines {
        /// The port whose control lines failed.
        port: String,
        /// The underlying failure.
        reason: String,
    },

    /// Connection lost while reading or writing
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },
}

/// Streaming error type
///
/// Represents errors raised while feeding the command queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The command file could not be read
    #[error("The file could not be read: {path}: {reason}")]
    FileRead {
        /// The file that failed.
        path: String,
        /// The underlying I/O message.
        reason: String,
    },

    /// The queue has a configured capacity and it is reached
    #[error("Command queue is full ({capacity} commands)")]
    QueueFull {
        /// The configured capacity.
        capacity: usize,
    },
}

/// Main error type for CNCSend
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Stream error
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a stream error
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Error::Stream(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
