//! Command queue
//!
//! Strict FIFO of pending command lines. No priority, no deduplication.
//! Unbounded unless a capacity is configured.

use cncsend_core::StreamError;
use std::collections::VecDeque;

/// Outbound line terminator, appended once at dispatch
pub const LINE_TERMINATOR: &str = "\r\n";

/// One protocol line awaiting transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
}

impl Command {
    /// Create a command from its text, without terminator
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The command text as queued
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bytes written to the line: text plus one `\r\n`
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.text.len() + LINE_TERMINATOR.len());
        frame.extend_from_slice(self.text.as_bytes());
        frame.extend_from_slice(LINE_TERMINATOR.as_bytes());
        frame
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// FIFO of pending commands
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
    capacity: Option<usize>,
}

impl CommandQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that rejects commands beyond `capacity`
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            commands: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    /// Append at the tail
    pub fn enqueue(&mut self, command: Command) -> Result<(), StreamError> {
        if let Some(capacity) = self.capacity {
            if self.commands.len() >= capacity {
                return Err(StreamError::QueueFull { capacity });
            }
        }
        self.commands.push_back(command);
        Ok(())
    }

    /// Put a dequeued command back at the head. Ignores the capacity, since
    /// the slot was just freed.
    pub fn requeue_front(&mut self, command: Command) {
        self.commands.push_front(command);
    }

    /// Remove and return the head
    pub fn dequeue(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every pending command, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.commands.len();
        self.commands.clear();
        dropped
    }

    /// Pending commands, head first
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
