use proptest::prelude::*;
use psukit_communication::protocol::{decode_measurement, decode_status, MeasurementTrim};
use psukit_core::{BaudRate, TrackingMode};

proptest! {
    // Decoding never fails on a well-formed 8-character status string
    #[test]
    fn decode_status_is_total_over_valid_strings(s in "[01]{8}") {
        let status = decode_status(&s).unwrap();
        let bytes = s.as_bytes();
        prop_assert_eq!(status.beep_enabled, bytes[4] == b'1');
        prop_assert_eq!(status.output_enabled, bytes[5] == b'1');
    }

    #[test]
    fn decode_status_is_deterministic(s in "[01]{8}") {
        prop_assert_eq!(decode_status(&s).unwrap(), decode_status(&s).unwrap());
    }

    #[test]
    fn decode_status_rejects_short_strings(s in "[01]{0,7}") {
        prop_assert!(decode_status(&s).is_err());
    }

    #[test]
    fn decode_status_rejects_non_binary_characters(s in "[2-9a-z]{8}") {
        prop_assert!(decode_status(&s).is_err());
    }

    #[test]
    fn decode_measurement_recovers_formatted_values(v in 0.0f64..100.0) {
        let raw = format!("{:.3}V", v);
        let parsed = decode_measurement(&raw, MeasurementTrim::SuffixChars(1)).unwrap();
        prop_assert!((parsed - v).abs() < 0.0005);
    }
}

#[test]
fn unlisted_bit_pairs_map_to_unknown() {
    // Tracking pair (0,0) and baud pair (1,1) are undefined on the wire
    let status = decode_status("00000011").unwrap();
    assert_eq!(status.tracking, TrackingMode::Unknown);
    assert_eq!(status.baud_rate, BaudRate::Unknown);
}
