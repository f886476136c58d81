//! # PSUKit Communication
//!
//! Serial transport, protocol codec, and instrument state model for PSUKit.
//! Translates between the instrument's text command vocabulary and the
//! structured state in `psukit-core`, and keeps that state synchronized with
//! the device through command-and-refresh round-trips and a measurement
//! poller.

pub mod communication;
pub mod instrument;
pub mod protocol;

pub use communication::{
    list_ports, ConnectionParams, NoOpTransport, SerialParity, SerialPortInfo, SerialTransport,
    Transport,
};

pub use instrument::{Instrument, InstrumentConfig};

pub use protocol::{
    decode_identity, decode_measurement, decode_status, CommandCreator, MeasurementTrim,
    IDENTITY_QUERY, STATUS_QUERY,
};
