//! Instrument listener interface
//!
//! Defines the listener trait presentation adapters implement to receive
//! instrument events.

use crate::data::{ChannelSettings, DeviceIdentity, DeviceStatus};
use async_trait::async_trait;

/// Handle for a registered instrument listener.
///
/// Uniquely identifies a listener subscription. Can be used to unsubscribe
/// from instrument events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentListenerHandle(pub String);

/// Listener trait for instrument events
///
/// Implement this trait to render instrument state and live measurements.
/// All methods default to no-ops so adapters only handle what they display.
#[async_trait]
pub trait InstrumentListener: Send + Sync {
    /// Called when a fresh status has been decoded from the instrument
    async fn on_status_changed(&self, _status: &DeviceStatus) {}

    /// Called once the instrument identity has been resolved
    async fn on_identity_resolved(&self, _identity: &DeviceIdentity) {}

    /// Called when the intended setpoint view changes
    async fn on_channel_settings_changed(&self, _settings: &ChannelSettings) {}

    /// Called with a live measurement for one channel while the output is on
    async fn on_live_measurement(&self, _channel: u8, _voltage: f64, _current: f64) {}

    /// Called with an operator-visible message for a recoverable error
    async fn on_error(&self, _message: &str) {}
}
