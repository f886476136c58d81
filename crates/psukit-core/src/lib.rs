//! # PSUKit Core
//!
//! Core types, traits, and error taxonomy for PSUKit.
//! Provides the data model for a four-channel bench power supply
//! (status, identity, setpoints, onboard memory slots) and the listener
//! contract presentation adapters implement.

pub mod core;
pub mod data;
pub mod error;

pub use crate::core::{InstrumentListener, InstrumentListenerHandle};

pub use data::{
    channel_index, round_setpoint, slot_index, BaudRate, ChannelMode, ChannelSettings,
    DeviceIdentity, DeviceStatus, SavedSlots, SetpointKind, TrackingMode, CHANNEL_COUNT,
    SLOT_COUNT,
};

pub use error::{CommandError, Error, ProtocolError, Result, TransportError};
