//! Error handling for PSUKit
//!
//! Provides error types for all layers of the control core:
//! - Protocol errors (decoding device replies)
//! - Command errors (operator-input validation)
//! - Transport errors (serial link failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Protocol decode error type
///
/// Represents failures to interpret a device reply. A malformed identity is
/// fatal to session start; a malformed status or measurement only fails the
/// read that produced it and may succeed on the next poll.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// Status reply is too short or contains characters other than '0'/'1'
    #[error("Malformed status reply: {raw:?}")]
    MalformedStatus {
        /// The raw reply that failed to decode.
        raw: String,
    },

    /// Identification reply has fewer than four comma-separated fields
    #[error("Malformed identification reply: {raw:?}")]
    MalformedIdentity {
        /// The raw reply that failed to decode.
        raw: String,
    },

    /// Measurement reply did not parse as a finite number
    #[error("Malformed measurement reply: {raw:?}")]
    MalformedMeasurement {
        /// The raw reply that failed to decode.
        raw: String,
    },
}

/// Command validation error type
///
/// Represents operator-input validation failures. These are always recovered
/// locally: prior state is left unchanged and the message is surfaced to the
/// operator.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// Channel number outside 1..=4
    #[error("Invalid channel {channel}, must be 1-4")]
    InvalidChannel {
        /// The rejected channel number.
        channel: u8,
    },

    /// Memory slot number outside 1..=4
    #[error("Invalid memory slot {slot}, must be 1-4")]
    InvalidSlot {
        /// The rejected slot number.
        slot: u8,
    },

    /// Setpoint value is negative or non-finite
    #[error("Invalid setpoint {value}, must be finite and non-negative")]
    InvalidSetpoint {
        /// The rejected setpoint value.
        value: f64,
    },

    /// Operator text did not parse as a number
    #[error("Invalid input {text:?}, expected a number")]
    InvalidInput {
        /// The rejected input text.
        text: String,
    },
}

/// Transport error type
///
/// Represents communication failures on the serial instrument link. The core
/// never retries; the operator must re-trigger the action.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Read timed out waiting for a reply
    #[error("Transport timeout after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Connection lost mid-session
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Transport is not connected
    #[error("Transport not connected")]
    NotConnected,

    /// I/O error
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },

    /// Generic transport error
    #[error("Transport error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for PSUKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Protocol decode error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Command validation error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

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

    /// Check if this error is recoverable operator input validation.
    ///
    /// Recoverable errors leave prior state unchanged and are surfaced to the
    /// operator as a message rather than ending the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Command(_))
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a protocol decode error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_errors_are_recoverable() {
        let err: Error = CommandError::InvalidChannel { channel: 5 }.into();
        assert!(err.is_recoverable());
        assert!(!err.is_transport_error());
    }

    #[test]
    fn protocol_errors_are_not_recoverable() {
        let err: Error = ProtocolError::MalformedStatus {
            raw: "010".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(err.is_protocol_error());
    }
}
