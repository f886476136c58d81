//! Status, identity, and measurement reply parsing
//!
//! The instrument reports its state as a fixed-position string of eight
//! '0'/'1' characters. Decoding is total over well-formed input: bit pair
//! combinations the protocol leaves undefined map to `Unknown` rather than
//! failing, since the wire format permits them.
//!
//! Bit layout of the `STATUS?` reply:
//!
//! | char | meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | channel 1 mode (0=CC, 1=CV)               |
//! | 1    | channel 2 mode (0=CC, 1=CV)               |
//! | 2,3  | tracking: 01=Independent, 11=Series, 10=Parallel |
//! | 4    | beep (1=on)                               |
//! | 5    | output (1=on)                             |
//! | 6,7  | baud: 00=115200, 01=57600, 10=9600        |

use psukit_core::{
    BaudRate, ChannelMode, DeviceIdentity, DeviceStatus, ProtocolError, TrackingMode,
};

/// Number of status characters in a `STATUS?` reply
pub const STATUS_LEN: usize = 8;

/// Characters of the fixed reply prefix stripped from the serial number field
const SERIAL_PREFIX_LEN: usize = 3;

/// Characters kept from the firmware version field
const FIRMWARE_LEN: usize = 5;

/// How to trim a measurement reply down to its numeric part
///
/// Observed firmware revisions differ in how much decoration a measurement
/// reply carries, so the trim is a protocol configuration rather than a
/// hardcoded constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementTrim {
    /// Strip a fixed number of trailing unit/terminator characters
    SuffixChars(usize),
    /// Strip a fixed number of leading characters
    PrefixChars(usize),
}

impl Default for MeasurementTrim {
    fn default() -> Self {
        // The transport strips the line terminator, leaving one unit letter
        // ("V" or "A") after the digits.
        Self::SuffixChars(1)
    }
}

/// Decode a `STATUS?` reply into a structured status
///
/// Fails with `MalformedStatus` if the reply is shorter than 8 characters or
/// any of the 8 status positions is not `'0'`/`'1'`. Undefined tracking and
/// baud combinations decode to `Unknown`.
pub fn decode_status(raw: &str) -> Result<DeviceStatus, ProtocolError> {
    let malformed = || ProtocolError::MalformedStatus {
        raw: raw.to_string(),
    };

    let chars: Vec<char> = raw.trim_end().chars().take(STATUS_LEN).collect();
    if chars.len() < STATUS_LEN {
        return Err(malformed());
    }

    let mut bits = [false; STATUS_LEN];
    for (i, c) in chars.iter().enumerate() {
        bits[i] = match c {
            '0' => false,
            '1' => true,
            _ => return Err(malformed()),
        };
    }

    let mode = |bit: bool| {
        if bit {
            ChannelMode::ConstantVoltage
        } else {
            ChannelMode::ConstantCurrent
        }
    };

    let tracking = match (bits[2], bits[3]) {
        (false, true) => TrackingMode::Independent,
        (true, true) => TrackingMode::Series,
        (true, false) => TrackingMode::Parallel,
        _ => TrackingMode::Unknown,
    };

    let baud_rate = match (bits[6], bits[7]) {
        (false, false) => BaudRate::Baud115200,
        (false, true) => BaudRate::Baud57600,
        (true, false) => BaudRate::Baud9600,
        _ => BaudRate::Unknown,
    };

    Ok(DeviceStatus {
        channel1_mode: mode(bits[0]),
        channel2_mode: mode(bits[1]),
        tracking,
        beep_enabled: bits[4],
        output_enabled: bits[5],
        baud_rate,
    })
}

/// Decode a `*IDN?` reply into a structured identity
///
/// Fails with `MalformedIdentity` if fewer than four comma-separated fields
/// are present. The serial number field carries a fixed 3-character reply
/// prefix that is stripped; the firmware field is truncated to its
/// significant 5 characters.
pub fn decode_identity(raw: &str) -> Result<DeviceIdentity, ProtocolError> {
    let fields: Vec<&str> = raw.trim_end().split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(ProtocolError::MalformedIdentity {
            raw: raw.to_string(),
        });
    }

    Ok(DeviceIdentity {
        manufacturer: fields[0].to_string(),
        model: fields[1].to_string(),
        serial_number: fields[2].chars().skip(SERIAL_PREFIX_LEN).collect(),
        firmware_version: fields[3].chars().take(FIRMWARE_LEN).collect(),
    })
}

/// Decode a measurement reply (`VOUTn?`, `IOUTn?`, `VSETn?`, `ISETn?`) into
/// its numeric value
///
/// Applies the configured trim to remove protocol decoration, then parses the
/// remainder as a finite float.
pub fn decode_measurement(raw: &str, trim: MeasurementTrim) -> Result<f64, ProtocolError> {
    let malformed = || ProtocolError::MalformedMeasurement {
        raw: raw.to_string(),
    };

    let chars: Vec<char> = raw.trim_end().chars().collect();
    let trimmed: String = match trim {
        MeasurementTrim::SuffixChars(n) => {
            if chars.len() < n {
                return Err(malformed());
            }
            chars[..chars.len() - n].iter().collect()
        }
        MeasurementTrim::PrefixChars(n) => {
            if chars.len() < n {
                return Err(malformed());
            }
            chars[n..].iter().collect()
        }
    };

    let value: f64 = trimmed.trim().parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_status_fixture() {
        let status = decode_status("01011000").unwrap();
        assert_eq!(status.channel1_mode, ChannelMode::ConstantCurrent);
        assert_eq!(status.channel2_mode, ChannelMode::ConstantVoltage);
        assert_eq!(status.tracking, TrackingMode::Independent);
        assert!(status.beep_enabled);
        assert!(!status.output_enabled);
        assert_eq!(status.baud_rate, BaudRate::Baud115200);
    }

    #[test]
    fn decode_status_tracking_variants() {
        assert_eq!(
            decode_status("00110000").unwrap().tracking,
            TrackingMode::Series
        );
        assert_eq!(
            decode_status("00100000").unwrap().tracking,
            TrackingMode::Parallel
        );
        assert_eq!(
            decode_status("00000000").unwrap().tracking,
            TrackingMode::Unknown
        );
    }

    #[test]
    fn decode_status_baud_variants() {
        assert_eq!(
            decode_status("00010001").unwrap().baud_rate,
            BaudRate::Baud57600
        );
        assert_eq!(
            decode_status("00010010").unwrap().baud_rate,
            BaudRate::Baud9600
        );
        assert_eq!(
            decode_status("00010011").unwrap().baud_rate,
            BaudRate::Unknown
        );
    }

    #[test]
    fn decode_status_rejects_short_or_nonbinary() {
        assert!(decode_status("0101100").is_err());
        assert!(decode_status("0101100x").is_err());
        assert!(decode_status("").is_err());
    }

    #[test]
    fn decode_status_ignores_line_terminators() {
        assert!(decode_status("01011000\r").is_ok());
    }

    #[test]
    fn decode_identity_strips_prefix_and_truncates_firmware() {
        let idn = decode_identity("GW INSTEK,GPD-4303S,SN:GEQ840525,V2.01.59").unwrap();
        assert_eq!(idn.manufacturer, "GW INSTEK");
        assert_eq!(idn.model, "GPD-4303S");
        assert_eq!(idn.serial_number, "GEQ840525");
        assert_eq!(idn.firmware_version, "V2.01");
    }

    #[test]
    fn decode_identity_rejects_short_reply() {
        assert!(decode_identity("GW INSTEK,GPD-4303S,SN:1").is_err());
        assert!(decode_identity("").is_err());
    }

    #[test]
    fn decode_measurement_strips_unit_suffix() {
        let trim = MeasurementTrim::default();
        assert_eq!(decode_measurement("12.000V", trim).unwrap(), 12.0);
        assert_eq!(decode_measurement("0.512A", trim).unwrap(), 0.512);
    }

    #[test]
    fn decode_measurement_prefix_variant() {
        let trim = MeasurementTrim::PrefixChars(5);
        assert_eq!(decode_measurement("VOUT1 3.300", trim).unwrap(), 3.3);
    }

    #[test]
    fn decode_measurement_rejects_garbage() {
        let trim = MeasurementTrim::default();
        assert!(decode_measurement("V", trim).is_err());
        assert!(decode_measurement("", trim).is_err());
        assert!(decode_measurement("abcV", trim).is_err());
    }
}
