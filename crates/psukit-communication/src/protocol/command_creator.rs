//! Command creation for the instrument's text protocol
//!
//! Pure string builders with no side effects. Setpoint values are rounded to
//! the 3 decimal places the wire format carries; channel and slot numbers are
//! validated before a command string is produced.

use psukit_core::{
    channel_index, round_setpoint, slot_index, BaudRate, CommandError, TrackingMode,
};

/// Query for the 8-character status string
pub const STATUS_QUERY: &str = "STATUS?";

/// Query for the comma-separated identification string
pub const IDENTITY_QUERY: &str = "*IDN?";

/// Builder for instrument command and query strings
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCreator;

impl CommandCreator {
    /// Create a new command creator
    pub fn new() -> Self {
        Self
    }

    fn validate_setpoint(value: f64) -> Result<f64, CommandError> {
        if !value.is_finite() || value < 0.0 {
            return Err(CommandError::InvalidSetpoint { value });
        }
        Ok(round_setpoint(value))
    }

    /// `VSETn:<value>` - set the voltage setpoint of a channel
    pub fn set_voltage(&self, channel: u8, value: f64) -> Result<String, CommandError> {
        channel_index(channel)?;
        let value = Self::validate_setpoint(value)?;
        Ok(format!("VSET{}:{:.3}", channel, value))
    }

    /// `ISETn:<value>` - set the current-limit setpoint of a channel
    pub fn set_current(&self, channel: u8, value: f64) -> Result<String, CommandError> {
        channel_index(channel)?;
        let value = Self::validate_setpoint(value)?;
        Ok(format!("ISET{}:{:.3}", channel, value))
    }

    /// `VOUTn?` - query the measured output voltage of a channel
    pub fn query_voltage(&self, channel: u8) -> Result<String, CommandError> {
        channel_index(channel)?;
        Ok(format!("VOUT{}?", channel))
    }

    /// `IOUTn?` - query the measured output current of a channel
    pub fn query_current(&self, channel: u8) -> Result<String, CommandError> {
        channel_index(channel)?;
        Ok(format!("IOUT{}?", channel))
    }

    /// `VSETn?` - query the stored voltage setpoint of a channel
    pub fn query_voltage_setpoint(&self, channel: u8) -> Result<String, CommandError> {
        channel_index(channel)?;
        Ok(format!("VSET{}?", channel))
    }

    /// `ISETn?` - query the stored current-limit setpoint of a channel
    pub fn query_current_setpoint(&self, channel: u8) -> Result<String, CommandError> {
        channel_index(channel)?;
        Ok(format!("ISET{}?", channel))
    }

    /// `OUT1` - enable the output stage
    pub fn output_on(&self) -> &'static str {
        "OUT1"
    }

    /// `OUT0` - disable the output stage
    pub fn output_off(&self) -> &'static str {
        "OUT0"
    }

    /// `RCLn` - recall onboard memory slot n
    pub fn recall(&self, slot: u8) -> Result<String, CommandError> {
        slot_index(slot)?;
        Ok(format!("RCL{}", slot))
    }

    /// `SAVn` - save current setpoints into onboard memory slot n
    pub fn save(&self, slot: u8) -> Result<String, CommandError> {
        slot_index(slot)?;
        Ok(format!("SAV{}", slot))
    }

    /// `BEEP1`/`BEEP0` - enable or disable the key beep
    pub fn beep(&self, enabled: bool) -> &'static str {
        if enabled {
            "BEEP1"
        } else {
            "BEEP0"
        }
    }

    /// `TRACK0`/`TRACK1`/`TRACK2` - select a tracking mode
    ///
    /// `Unknown` cannot be commanded; callers recover from an unknown reported
    /// mode via [`CommandCreator::tracking_next`].
    pub fn tracking(&self, mode: TrackingMode) -> Result<&'static str, CommandError> {
        match mode {
            TrackingMode::Independent => Ok("TRACK0"),
            TrackingMode::Series => Ok("TRACK1"),
            TrackingMode::Parallel => Ok("TRACK2"),
            TrackingMode::Unknown => Err(CommandError::InvalidInput {
                text: mode.to_string(),
            }),
        }
    }

    /// Command for the tracking mode that follows `current` in the cycle
    /// Independent -> Series -> Parallel -> Independent.
    ///
    /// An `Unknown` reported mode recovers by forcing Independent, putting the
    /// instrument back into a defined coupling.
    pub fn tracking_next(&self, current: TrackingMode) -> &'static str {
        match current {
            TrackingMode::Independent => "TRACK1",
            TrackingMode::Series => "TRACK2",
            TrackingMode::Parallel => "TRACK0",
            TrackingMode::Unknown => {
                tracing::warn!("Unknown tracking mode reported, forcing Independent");
                "TRACK0"
            }
        }
    }

    /// `BAUDn` - select the serial link baud rate
    ///
    /// Numbering follows the status bit encoding: 0=115200, 1=57600, 2=9600.
    pub fn set_baud(&self, rate: BaudRate) -> Result<&'static str, CommandError> {
        match rate {
            BaudRate::Baud115200 => Ok("BAUD0"),
            BaudRate::Baud57600 => Ok("BAUD1"),
            BaudRate::Baud9600 => Ok("BAUD2"),
            BaudRate::Unknown => Err(CommandError::InvalidInput {
                text: rate.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_commands_round_to_three_decimals() {
        let creator = CommandCreator::new();
        assert_eq!(creator.set_voltage(1, 5.0).unwrap(), "VSET1:5.000");
        assert_eq!(creator.set_voltage(3, 1.23456).unwrap(), "VSET3:1.235");
        assert_eq!(creator.set_current(2, 0.5).unwrap(), "ISET2:0.500");
    }

    #[test]
    fn setpoint_commands_reject_bad_values() {
        let creator = CommandCreator::new();
        assert!(matches!(
            creator.set_voltage(1, -0.5),
            Err(CommandError::InvalidSetpoint { .. })
        ));
        assert!(matches!(
            creator.set_voltage(1, f64::NAN),
            Err(CommandError::InvalidSetpoint { .. })
        ));
        assert!(matches!(
            creator.set_current(2, f64::INFINITY),
            Err(CommandError::InvalidSetpoint { .. })
        ));
    }

    #[test]
    fn channel_out_of_range_is_rejected() {
        let creator = CommandCreator::new();
        assert!(matches!(
            creator.set_voltage(5, 1.0),
            Err(CommandError::InvalidChannel { channel: 5 })
        ));
        assert!(matches!(
            creator.query_voltage(0),
            Err(CommandError::InvalidChannel { channel: 0 })
        ));
    }

    #[test]
    fn measurement_queries() {
        let creator = CommandCreator::new();
        assert_eq!(creator.query_voltage(1).unwrap(), "VOUT1?");
        assert_eq!(creator.query_current(4).unwrap(), "IOUT4?");
        assert_eq!(creator.query_voltage_setpoint(2).unwrap(), "VSET2?");
        assert_eq!(creator.query_current_setpoint(3).unwrap(), "ISET3?");
    }

    #[test]
    fn memory_slot_commands() {
        let creator = CommandCreator::new();
        assert_eq!(creator.recall(1).unwrap(), "RCL1");
        assert_eq!(creator.save(4).unwrap(), "SAV4");
        assert!(matches!(
            creator.recall(5),
            Err(CommandError::InvalidSlot { slot: 5 })
        ));
        assert!(creator.save(0).is_err());
    }

    #[test]
    fn tracking_cycle_is_deterministic() {
        let creator = CommandCreator::new();
        assert_eq!(creator.tracking_next(TrackingMode::Independent), "TRACK1");
        assert_eq!(creator.tracking_next(TrackingMode::Series), "TRACK2");
        assert_eq!(creator.tracking_next(TrackingMode::Parallel), "TRACK0");
        // Unknown recovers to a defined coupling
        assert_eq!(creator.tracking_next(TrackingMode::Unknown), "TRACK0");
    }

    #[test]
    fn fixed_commands() {
        let creator = CommandCreator::new();
        assert_eq!(creator.output_on(), "OUT1");
        assert_eq!(creator.output_off(), "OUT0");
        assert_eq!(creator.beep(true), "BEEP1");
        assert_eq!(creator.beep(false), "BEEP0");
        assert_eq!(creator.set_baud(BaudRate::Baud9600).unwrap(), "BAUD2");
        assert!(creator.set_baud(BaudRate::Unknown).is_err());
    }
}
