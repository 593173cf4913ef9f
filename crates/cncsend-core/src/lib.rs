//! # CNCSend Core
//!
//! Core types shared by the CNCSend crates: the error taxonomy, message
//! levels with the sink that carries operator-facing output, and the
//! sentinel matching mode used to detect command completion.

pub mod error;
pub mod message;
pub mod types;

pub use error::{ConnectionError, Error, Result, StreamError};
pub use message::{MessageLevel, MessageSink, TracingSink};
pub use types::SentinelMatch;
