//! Transport abstraction for the serial instrument link
//!
//! The instrument speaks a line-oriented text protocol: commands are sent as
//! single lines, queries return single-line replies. The underlying link
//! cannot handle interleaved requests, so a transport is always accessed
//! sequentially behind one exclusive handle.

pub mod serial;

pub use serial::{list_ports, SerialPortInfo, SerialTransport};

use psukit_core::Result;
use serde::{Deserialize, Serialize};

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerialParity {
    /// No parity bit
    #[default]
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Parameters for opening an instrument connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate (the instrument defaults to 115200)
    pub baud_rate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    /// Stop bits (1-2)
    pub stop_bits: u8,
    /// Parity setting
    pub parity: SerialParity,
    /// Hardware flow control
    pub flow_control: bool,
    /// Read timeout for query replies, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: false,
            timeout_ms: 500,
        }
    }
}

/// Sequential command/query access to an instrument
///
/// Implementations are not retried by the core; a failure propagates to the
/// caller and the operator re-triggers the action. `close` must be idempotent.
pub trait Transport: Send {
    /// Send a command line, without waiting for a reply
    fn send(&mut self, command: &str) -> Result<()>;

    /// Send a query line and wait for the single-line reply
    ///
    /// The returned string has the line terminator stripped; any unit suffix
    /// the instrument appends is left in place for the codec to handle.
    fn query(&mut self, command: &str) -> Result<String>;

    /// Whether the transport currently holds an open connection
    fn is_connected(&self) -> bool;

    /// Release the underlying connection
    fn close(&mut self) -> Result<()>;
}

/// Transport that accepts commands and answers no queries
///
/// Useful for wiring tests and dry runs without hardware.
#[derive(Debug, Default)]
pub struct NoOpTransport {
    closed: bool,
}

impl NoOpTransport {
    /// Create a new no-op transport
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for NoOpTransport {
    fn send(&mut self, command: &str) -> Result<()> {
        tracing::debug!("NoOpTransport dropping command: {}", command);
        Ok(())
    }

    fn query(&mut self, _command: &str) -> Result<String> {
        Err(psukit_core::TransportError::NotConnected.into())
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
