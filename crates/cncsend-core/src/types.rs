//! Shared protocol types

use serde::{Deserialize, Serialize};

/// How the completion token is located in the inbound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelMatch {
    /// Token anywhere in the buffer. Compatible with existing firmware, but
    /// a response that merely mentions the token also completes the command.
    #[default]
    Substring,
    /// Token must start a line and be followed by a line terminator
    Line,
}

impl std::fmt::Display for SentinelMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring => write!(f, "substring"),
            Self::Line => write!(f, "line"),
        }
    }
}
