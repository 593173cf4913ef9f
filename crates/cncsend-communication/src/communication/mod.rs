//! Serial line plumbing: port discovery, the link abstraction, and the
//! connection manager that reconciles operator intent with the hardware.

pub mod connection;
pub mod discovery;
pub mod serial;

use std::time::Duration;

/// Default read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 20;

/// Fixed line parameters applied on every open
///
/// The firmware speaks 9600 baud, 8 data bits, no parity, one stop bit, and
/// expects both DTR and RTS asserted. Only the read timeout varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: u8,
    /// Stop bits per character
    pub stop_bits: u8,
    /// Assert data-terminal-ready after open
    pub dtr: bool,
    /// Assert request-to-send after open
    pub rts: bool,
    /// Upper bound on a single read before it reports a timeout
    pub read_timeout: Duration,
}

impl LineSettings {
    /// Fixed parameters with a custom read timeout
    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ..Self::default()
        }
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            dtr: true,
            rts: true,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}
