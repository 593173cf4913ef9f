//! Operator-facing messages
//!
//! The streaming engine does not print. It hands `(level, text)` pairs to a
//! [`MessageSink`], which the host wires to wherever the operator looks.

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageLevel {
    /// Debug message
    Debug,
    /// Info message
    Info,
    /// Warning message, also used for responses that need attention
    Warning,
    /// Error message
    Error,
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERR"),
        }
    }
}

/// Receiver of operator-facing messages
pub trait MessageSink: Send {
    /// Emit a single message
    fn emit(&mut self, level: MessageLevel, message: &str);
}

/// Sink that forwards every message to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn emit(&mut self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Debug => tracing::debug!(target: "cncsend::device", "{}", message),
            MessageLevel::Info => tracing::info!(target: "cncsend::device", "{}", message),
            MessageLevel::Warning => tracing::warn!(target: "cncsend::device", "{}", message),
            MessageLevel::Error => tracing::error!(target: "cncsend::device", "{}", message),
        }
    }
}

impl<F> MessageSink for F
where
    F: FnMut(MessageLevel, &str) + Send,
{
    fn emit(&mut self, level: MessageLevel, message: &str) {
        self(level, message)
    }
}
