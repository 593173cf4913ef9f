//! Acknowledged command streaming: the queue, the completion sentinel, the
//! response classifier, the tick scheduler, and the engine tying them to the
//! connection.

pub mod classifier;
pub mod engine;
pub mod queue;
pub mod scheduler;
pub mod sentinel;
