//! Data model for the instrument control core

pub mod identity;
pub mod settings;
pub mod status;

pub use identity::DeviceIdentity;
pub use settings::{
    channel_index, round_setpoint, slot_index, ChannelSettings, SavedSlots, SetpointKind,
    CHANNEL_COUNT, SLOT_COUNT,
};
pub use status::{BaudRate, ChannelMode, DeviceStatus, TrackingMode};
