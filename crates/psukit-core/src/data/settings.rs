//! Channel setpoints and onboard memory snapshots
//!
//! `ChannelSettings` is the *intended* local view of the voltage and
//! current-limit setpoints. It may diverge from device truth until the next
//! reconciliation; while the output is on, the live measured view owns the
//! display instead.

use crate::error::CommandError;
use serde::{Deserialize, Serialize};

/// Number of independent output channels
pub const CHANNEL_COUNT: usize = 4;

/// Number of onboard memory slots
pub const SLOT_COUNT: usize = 4;

/// Which setpoint of a channel an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetpointKind {
    /// Voltage setpoint
    Voltage,
    /// Current-limit setpoint
    Current,
}

impl std::fmt::Display for SetpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Voltage => write!(f, "voltage"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Round a setpoint to the 3 decimal places the wire protocol carries
pub fn round_setpoint(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Validate a channel number and convert it to an array index
pub fn channel_index(channel: u8) -> Result<usize, CommandError> {
    if (1..=CHANNEL_COUNT as u8).contains(&channel) {
        Ok(usize::from(channel) - 1)
    } else {
        Err(CommandError::InvalidChannel { channel })
    }
}

/// Validate a memory slot number and convert it to an array index
pub fn slot_index(slot: u8) -> Result<usize, CommandError> {
    if (1..=SLOT_COUNT as u8).contains(&slot) {
        Ok(usize::from(slot) - 1)
    } else {
        Err(CommandError::InvalidSlot { slot })
    }
}

/// Voltage and current-limit setpoints for all four channels
///
/// Values are rounded to 3 decimal places on write, matching the precision
/// the command vocabulary can express.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelSettings {
    voltage: [f64; CHANNEL_COUNT],
    current: [f64; CHANNEL_COUNT],
}

impl ChannelSettings {
    /// Create settings with all setpoints at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Voltage setpoint for a channel (1-4)
    pub fn voltage(&self, channel: u8) -> Result<f64, CommandError> {
        Ok(self.voltage[channel_index(channel)?])
    }

    /// Current-limit setpoint for a channel (1-4)
    pub fn current(&self, channel: u8) -> Result<f64, CommandError> {
        Ok(self.current[channel_index(channel)?])
    }

    /// Setpoint of the given kind for a channel (1-4)
    pub fn get(&self, channel: u8, kind: SetpointKind) -> Result<f64, CommandError> {
        match kind {
            SetpointKind::Voltage => self.voltage(channel),
            SetpointKind::Current => self.current(channel),
        }
    }

    /// Set the voltage setpoint for a channel (1-4), rounding to 3 decimals
    pub fn set_voltage(&mut self, channel: u8, value: f64) -> Result<(), CommandError> {
        let idx = channel_index(channel)?;
        self.voltage[idx] = round_setpoint(value);
        Ok(())
    }

    /// Set the current-limit setpoint for a channel (1-4), rounding to 3 decimals
    pub fn set_current(&mut self, channel: u8, value: f64) -> Result<(), CommandError> {
        let idx = channel_index(channel)?;
        self.current[idx] = round_setpoint(value);
        Ok(())
    }

    /// Set the setpoint of the given kind for a channel (1-4)
    pub fn set(&mut self, channel: u8, kind: SetpointKind, value: f64) -> Result<(), CommandError> {
        match kind {
            SetpointKind::Voltage => self.set_voltage(channel, value),
            SetpointKind::Current => self.set_current(channel, value),
        }
    }

    /// Reset every setpoint to zero
    pub fn zero_all(&mut self) {
        self.voltage = [0.0; CHANNEL_COUNT];
        self.current = [0.0; CHANNEL_COUNT];
    }
}

/// The four onboard memory slots, mirroring recall positions 1-4
///
/// Each slot holds a full `ChannelSettings` snapshot. Slots are overwritten
/// wholesale on save and never merged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedSlots {
    slots: [ChannelSettings; SLOT_COUNT],
}

impl SavedSlots {
    /// Create slots with all setpoints at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot stored in a slot (1-4)
    pub fn get(&self, slot: u8) -> Result<ChannelSettings, CommandError> {
        Ok(self.slots[slot_index(slot)?])
    }

    /// Overwrite a slot (1-4) with a full snapshot
    pub fn store(&mut self, slot: u8, snapshot: ChannelSettings) -> Result<(), CommandError> {
        let idx = slot_index(slot)?;
        self.slots[idx] = snapshot;
        Ok(())
    }
}
