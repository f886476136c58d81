//! Protocol codec for the instrument's text command vocabulary
//!
//! Pure translation between wire strings and structured values. No I/O
//! happens here; the instrument module drives the transport with the strings
//! this module produces and feeds replies back through its decoders.

pub mod command_creator;
pub mod status_parser;

pub use command_creator::{CommandCreator, IDENTITY_QUERY, STATUS_QUERY};
pub use status_parser::{
    decode_identity, decode_measurement, decode_status, MeasurementTrim, STATUS_LEN,
};
