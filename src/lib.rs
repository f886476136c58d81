//! # PSUKit
//!
//! A Rust-based control core for four-channel bench power supplies speaking
//! the GPD-4303S text command protocol over a serial instrument link.
//!
//! ## Architecture
//!
//! PSUKit is organized as a workspace with multiple crates:
//!
//! 1. **psukit-core** - Core types, error taxonomy, listener contract
//! 2. **psukit-communication** - Serial transport, protocol codec, instrument
//!    state model and measurement poller
//! 3. **psukit** - Console front-end that integrates the crates
//!
//! Presentation layers (GUI or otherwise) are external collaborators: they
//! implement [`InstrumentListener`] to render state and call the operations
//! on [`Instrument`] to relay operator intents.

pub use psukit_core::{
    BaudRate, ChannelMode, ChannelSettings, CommandError, DeviceIdentity, DeviceStatus, Error,
    InstrumentListener, InstrumentListenerHandle, ProtocolError, Result, SavedSlots, SetpointKind,
    TrackingMode, TransportError, CHANNEL_COUNT, SLOT_COUNT,
};

pub use psukit_communication::{
    list_ports, CommandCreator, ConnectionParams, Instrument, InstrumentConfig, MeasurementTrim,
    NoOpTransport, SerialParity, SerialPortInfo, SerialTransport, Transport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
