//! Core traits for instrument management

pub mod listener;

pub use listener::{InstrumentListener, InstrumentListenerHandle};
