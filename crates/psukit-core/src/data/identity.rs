//! Instrument identity
//!
//! Structured view of the `*IDN?` reply. Read once at session start and
//! immutable afterwards.

use serde::{Deserialize, Serialize};

/// Decoded instrument identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Manufacturer name
    pub manufacturer: String,
    /// Model number
    pub model: String,
    /// Serial number, with the fixed reply prefix stripped
    pub serial_number: String,
    /// Firmware version, truncated to the significant five characters
    pub firmware_version: String,
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (SN {}, FW {})",
            self.manufacturer, self.model, self.serial_number, self.firmware_version
        )
    }
}
