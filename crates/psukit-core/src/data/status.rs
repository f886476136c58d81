//! Device-reported status
//!
//! Structured view of the instrument's `STATUS?` reply. The status is always
//! replaced wholesale on each decode and is the single source of truth for
//! device-reported state; no operation patches individual fields.

use serde::{Deserialize, Serialize};

/// Regulation mode of an output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMode {
    /// Constant current regulation
    ConstantCurrent,
    /// Constant voltage regulation
    ConstantVoltage,
}

impl std::fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstantCurrent => write!(f, "CC"),
            Self::ConstantVoltage => write!(f, "CV"),
        }
    }
}

/// Instrument-level coupling of channel 1 and 2 outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Channels operate independently
    Independent,
    /// Channels 1 and 2 in series
    Series,
    /// Channels 1 and 2 in parallel
    Parallel,
    /// Undefined bit combination reported by the instrument
    Unknown,
}

impl std::fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Independent => write!(f, "Independent"),
            Self::Series => write!(f, "Series"),
            Self::Parallel => write!(f, "Parallel"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Serial link baud rate reported by the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaudRate {
    /// 115200 baud
    Baud115200,
    /// 57600 baud
    Baud57600,
    /// 9600 baud
    Baud9600,
    /// Undefined bit combination reported by the instrument
    Unknown,
}

impl BaudRate {
    /// Numeric baud rate, if the reported combination is defined
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Baud115200 => Some(115_200),
            Self::Baud57600 => Some(57_600),
            Self::Baud9600 => Some(9_600),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Baud115200 => write!(f, "115200"),
            Self::Baud57600 => write!(f, "57600"),
            Self::Baud9600 => write!(f, "9600"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Decoded instrument status
///
/// Every field is populated at construction; there is no partially-decoded
/// status. Undefined tracking/baud bit pairs decode to `Unknown` rather than
/// failing, since the wire protocol permits undefined combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Regulation mode of channel 1
    pub channel1_mode: ChannelMode,
    /// Regulation mode of channel 2
    pub channel2_mode: ChannelMode,
    /// Channel 1/2 output coupling
    pub tracking: TrackingMode,
    /// Key beep enabled
    pub beep_enabled: bool,
    /// Output stage enabled
    pub output_enabled: bool,
    /// Serial link baud rate
    pub baud_rate: BaudRate,
}
