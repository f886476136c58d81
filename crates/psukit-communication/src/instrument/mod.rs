//! Instrument state model
//!
//! Orchestrates codec calls and transport round-trips into consistent
//! observable state. The instrument is authoritative: every state-changing
//! command is followed by a status refresh, so local state is resynchronized
//! from the device rather than assumed.
//!
//! The transport is owned exclusively and accessed sequentially behind one
//! mutex; the measurement poll task and the command path serialize on it
//! because the underlying serial link cannot handle interleaved requests.

use crate::communication::Transport;
use crate::protocol::{
    decode_identity, decode_measurement, decode_status, CommandCreator, MeasurementTrim,
    IDENTITY_QUERY, STATUS_QUERY,
};
use parking_lot::{Mutex, RwLock};
use psukit_core::{
    BaudRate, ChannelSettings, CommandError, DeviceIdentity, DeviceStatus, Error,
    InstrumentListener, InstrumentListenerHandle, Result, SavedSlots, SetpointKind, TrackingMode,
    CHANNEL_COUNT, SLOT_COUNT,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use uuid::Uuid;

/// Configuration for an instrument session
#[derive(Debug, Clone, Copy)]
pub struct InstrumentConfig {
    /// Measurement poll interval in milliseconds.
    ///
    /// Must exceed the total round-trip time of the 8 measurement queries a
    /// tick performs, or ticks are skipped.
    pub poll_interval_ms: u64,
    /// How measurement replies are trimmed before numeric parsing
    pub measurement_trim: MeasurementTrim,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            measurement_trim: MeasurementTrim::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct InstrumentState {
    status: Option<DeviceStatus>,
    identity: Option<DeviceIdentity>,
    settings: ChannelSettings,
    slots: SavedSlots,
    shut_down: bool,
}

/// Query all 8 measurements (4 voltage, 4 current) in one sequence
fn poll_all_channels(
    transport: &mut dyn Transport,
    creator: &CommandCreator,
    trim: MeasurementTrim,
) -> Result<Vec<(u8, f64, f64)>> {
    let mut samples = Vec::with_capacity(CHANNEL_COUNT);
    for channel in 1..=CHANNEL_COUNT as u8 {
        let v_raw = transport.query(&creator.query_voltage(channel)?)?;
        let i_raw = transport.query(&creator.query_current(channel)?)?;
        let voltage = decode_measurement(&v_raw, trim)?;
        let current = decode_measurement(&i_raw, trim)?;
        samples.push((channel, voltage, current));
    }
    Ok(samples)
}

/// A session with one four-channel bench power supply
///
/// Exclusively owns the decoded status, identity, channel settings, and the
/// four saved-state slots; presentation adapters observe them through
/// registered [`InstrumentListener`]s and mutate them only through the
/// operations below.
pub struct Instrument {
    /// Name identifier
    name: String,
    /// Exclusive handle to the serial link
    transport: Arc<Mutex<Box<dyn Transport>>>,
    /// Command string builder
    creator: CommandCreator,
    /// Session configuration
    config: InstrumentConfig,
    /// Decoded state
    state: Arc<RwLock<InstrumentState>>,
    /// Measurement poll task, while the output is on
    poll_task: Option<JoinHandle<()>>,
    /// Shutdown signal for the poll task
    poll_shutdown: Option<mpsc::Sender<()>>,
    /// Registered instrument listeners
    listeners: Arc<RwLock<HashMap<String, Arc<dyn InstrumentListener>>>>,
}

impl Instrument {
    /// Create an instrument over an open transport
    pub fn new(transport: Box<dyn Transport>, config: InstrumentConfig, name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| "GPD-4303S".to_string()),
            transport: Arc::new(Mutex::new(transport)),
            creator: CommandCreator::new(),
            config,
            state: Arc::new(RwLock::new(InstrumentState::default())),
            poll_task: None,
            poll_shutdown: None,
            listeners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Name identifier for this session
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last decoded status, if any
    pub fn status(&self) -> Option<DeviceStatus> {
        self.state.read().status
    }

    /// Resolved identity, once read
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.state.read().identity.clone()
    }

    /// The intended setpoint view
    pub fn channel_settings(&self) -> ChannelSettings {
        self.state.read().settings
    }

    /// Snapshot held in a saved-state slot (1-4)
    pub fn saved_slot(&self, slot: u8) -> Result<ChannelSettings> {
        Ok(self.state.read().slots.get(slot)?)
    }

    /// Whether the last decoded status reported the output enabled
    pub fn output_enabled(&self) -> bool {
        self.state
            .read()
            .status
            .map(|s| s.output_enabled)
            .unwrap_or(false)
    }

    /// Whether the measurement poll task is running
    pub fn is_polling(&self) -> bool {
        self.poll_task.is_some()
    }

    /// Register a listener for instrument events
    pub fn register_listener(
        &mut self,
        listener: Arc<dyn InstrumentListener>,
    ) -> InstrumentListenerHandle {
        let id = Uuid::new_v4().to_string();
        let handle = InstrumentListenerHandle(id.clone());
        self.listeners.write().insert(id, listener);
        handle
    }

    /// Unregister a previously registered listener
    pub fn unregister_listener(&mut self, handle: InstrumentListenerHandle) {
        let _ = self.listeners.write().remove(&handle.0);
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn send(&self, command: &str) -> Result<()> {
        self.transport.lock().send(command)
    }

    fn query(&self, command: &str) -> Result<String> {
        self.transport.lock().query(command)
    }

    fn snapshot_listeners(&self) -> Vec<Arc<dyn InstrumentListener>> {
        self.listeners.read().values().cloned().collect()
    }

    async fn notify_status(&self, status: &DeviceStatus) {
        for listener in self.snapshot_listeners() {
            listener.on_status_changed(status).await;
        }
    }

    async fn notify_identity(&self, identity: &DeviceIdentity) {
        for listener in self.snapshot_listeners() {
            listener.on_identity_resolved(identity).await;
        }
    }

    async fn notify_settings(&self, settings: &ChannelSettings) {
        for listener in self.snapshot_listeners() {
            listener.on_channel_settings_changed(settings).await;
        }
    }

    async fn notify_error(&self, message: &str) {
        tracing::warn!("{}", message);
        for listener in self.snapshot_listeners() {
            listener.on_error(message).await;
        }
    }

    /// Surface a recoverable operator-input error and hand it back
    async fn reject(&self, err: CommandError) -> Error {
        let err: Error = err.into();
        self.notify_error(&err.to_string()).await;
        err
    }

    /// Open the session: resolve identity, read status, mirror onboard memory
    ///
    /// Identity failure is fatal; the session cannot proceed without knowing
    /// the connected instrument. If the output is already enabled, onboard
    /// memory readback is skipped (recalling slots would stomp the energized
    /// setpoints) and live polling starts right away.
    pub async fn connect(&mut self) -> Result<()> {
        let identity = self.refresh_identity().await?;
        tracing::info!("Connected to {}", identity);

        let status = self.refresh_status().await?;
        if status.output_enabled {
            tracing::warn!("Output already enabled at session start, skipping memory readback");
            self.start_polling();
        } else {
            self.sync_saved_slots().await?;
        }
        Ok(())
    }

    /// Query the status string, decode it, and replace the status wholesale
    pub async fn refresh_status(&mut self) -> Result<DeviceStatus> {
        let raw = self.query(STATUS_QUERY)?;
        let status = decode_status(&raw)?;
        self.state.write().status = Some(status);
        self.notify_status(&status).await;
        Ok(status)
    }

    /// Resolve the instrument identity; a no-op after the first success
    pub async fn refresh_identity(&mut self) -> Result<DeviceIdentity> {
        if let Some(identity) = self.identity() {
            return Ok(identity);
        }
        let raw = self.query(IDENTITY_QUERY)?;
        let identity = decode_identity(&raw)?;
        self.state.write().identity = Some(identity.clone());
        self.notify_identity(&identity).await;
        Ok(identity)
    }

    /// Mirror the instrument's onboard memory into the saved-state slots
    ///
    /// Recalls each slot and reads its setpoints back, then recalls slot 1 so
    /// the instrument rests at a known position. Only meaningful while the
    /// output is off.
    pub async fn sync_saved_slots(&mut self) -> Result<()> {
        let trim = self.config.measurement_trim;
        let mut slots = SavedSlots::new();

        for slot in 1..=SLOT_COUNT as u8 {
            self.send(&self.creator.recall(slot)?)?;
            let mut snapshot = ChannelSettings::new();
            for channel in 1..=CHANNEL_COUNT as u8 {
                let v_raw = self.query(&self.creator.query_voltage_setpoint(channel)?)?;
                let i_raw = self.query(&self.creator.query_current_setpoint(channel)?)?;
                snapshot.set_voltage(channel, decode_measurement(&v_raw, trim)?)?;
                snapshot.set_current(channel, decode_measurement(&i_raw, trim)?)?;
            }
            slots.store(slot, snapshot)?;
        }

        self.send(&self.creator.recall(1)?)?;
        let settings = slots.get(1)?;
        {
            let mut st = self.state.write();
            st.slots = slots;
            st.settings = settings;
        }
        self.notify_settings(&settings).await;
        self.refresh_status().await?;
        Ok(())
    }

    /// Parse operator text and write one setpoint
    ///
    /// A parse failure is recovered locally: the settings stay unchanged and
    /// the message is surfaced through `on_error`. On success the command is
    /// issued; the intended view is updated only while the output is off,
    /// since the live measured view owns the display while it is on.
    pub async fn set_channel_value(
        &mut self,
        channel: u8,
        kind: SetpointKind,
        raw_text: &str,
    ) -> Result<()> {
        let value: f64 = match raw_text.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                return Err(self
                    .reject(CommandError::InvalidInput {
                        text: raw_text.to_string(),
                    })
                    .await);
            }
        };

        let command = match kind {
            SetpointKind::Voltage => self.creator.set_voltage(channel, value),
            SetpointKind::Current => self.creator.set_current(channel, value),
        };
        let command = match command {
            Ok(command) => command,
            Err(e) => return Err(self.reject(e).await),
        };

        self.send(&command)?;

        if !self.output_enabled() {
            let settings = {
                let mut st = self.state.write();
                st.settings.set(channel, kind, value)?;
                st.settings
            };
            self.notify_settings(&settings).await;
        }

        self.refresh_status().await?;
        Ok(())
    }

    /// Flip the output stage
    ///
    /// Turning on starts the measurement poller once the instrument confirms
    /// the transition; turning off stops the poller first and restores the
    /// setpoint view. Both directions resynchronize from the instrument.
    pub async fn toggle_output(&mut self) -> Result<()> {
        if self.output_enabled() {
            self.stop_polling().await;
            self.send(self.creator.output_off())?;
            self.refresh_status().await?;
            let settings = self.channel_settings();
            self.notify_settings(&settings).await;
        } else {
            self.send(self.creator.output_on())?;
            let status = self.refresh_status().await?;
            if status.output_enabled {
                self.start_polling();
            } else {
                tracing::warn!("Instrument did not confirm output on");
            }
        }
        Ok(())
    }

    /// Recall a saved-state slot (1-4)
    ///
    /// The instrument's output state during recall is undefined, so any
    /// active polling stops first and resumes only if the refreshed status
    /// still reports the output enabled.
    pub async fn load_slot(&mut self, slot: u8) -> Result<()> {
        let command = match self.creator.recall(slot) {
            Ok(command) => command,
            Err(e) => return Err(self.reject(e).await),
        };

        self.stop_polling().await;
        self.send(&command)?;

        let settings = {
            let mut st = self.state.write();
            let snapshot = st.slots.get(slot)?;
            st.settings = snapshot;
            snapshot
        };
        self.notify_settings(&settings).await;

        let status = self.refresh_status().await?;
        if status.output_enabled {
            self.start_polling();
        }
        Ok(())
    }

    /// Save the current setpoints into a slot (1-4)
    ///
    /// Overwrites the slot wholesale. Persistence is not verified; the
    /// instrument does not echo saves.
    pub async fn save_slot(&mut self, slot: u8) -> Result<()> {
        let command = match self.creator.save(slot) {
            Ok(command) => command,
            Err(e) => return Err(self.reject(e).await),
        };

        self.send(&command)?;
        let mut st = self.state.write();
        let snapshot = st.settings;
        st.slots.store(slot, snapshot)?;
        Ok(())
    }

    /// Zero every voltage and current-limit setpoint
    ///
    /// Never issues zeroing commands while energized: if the output is on it
    /// is toggled off first.
    pub async fn reset_channels(&mut self) -> Result<()> {
        if self.output_enabled() {
            self.toggle_output().await?;
        }

        for channel in 1..=CHANNEL_COUNT as u8 {
            self.send(&self.creator.set_current(channel, 0.0)?)?;
            self.send(&self.creator.set_voltage(channel, 0.0)?)?;
        }

        let settings = {
            let mut st = self.state.write();
            st.settings.zero_all();
            st.settings
        };
        self.notify_settings(&settings).await;
        self.refresh_status().await?;
        Ok(())
    }

    /// Flip the key beep
    pub async fn toggle_beep(&mut self) -> Result<()> {
        let current = self.status().map(|s| s.beep_enabled).unwrap_or(false);
        self.send(self.creator.beep(!current))?;
        self.refresh_status().await?;
        Ok(())
    }

    /// Advance the tracking mode one step in the cycle
    /// Independent -> Series -> Parallel -> Independent
    ///
    /// An unknown reported mode recovers by forcing Independent.
    pub async fn cycle_tracking(&mut self) -> Result<()> {
        let current = self
            .status()
            .map(|s| s.tracking)
            .unwrap_or(TrackingMode::Unknown);
        self.send(self.creator.tracking_next(current))?;
        self.refresh_status().await?;
        Ok(())
    }

    /// Select the serial link baud rate
    ///
    /// The link must be reopened at the new rate before further traffic, so
    /// this skips the usual status refresh.
    pub async fn set_baud(&mut self, rate: BaudRate) -> Result<()> {
        let command = match self.creator.set_baud(rate) {
            Ok(command) => command,
            Err(e) => return Err(self.reject(e).await),
        };
        self.send(command)?;
        Ok(())
    }

    /// End the session: output off, polling stopped, transport released
    ///
    /// Idempotent and safe to call multiple times, e.g. from both an explicit
    /// exit action and a window-close event. Blocks until any in-flight poll
    /// tick has completed before releasing the transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state.read().shut_down {
            return Ok(());
        }

        self.stop_polling().await;
        if self.output_enabled() {
            self.send(self.creator.output_off())?;
            if let Err(e) = self.refresh_status().await {
                tracing::warn!("Status refresh during shutdown failed: {}", e);
            }
        }

        self.state.write().shut_down = true;
        self.transport.lock().close()?;
        tracing::info!("Session with {} closed", self.name);
        Ok(())
    }

    /// Start the measurement poll task
    fn start_polling(&mut self) {
        if self.poll_task.is_some() {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let transport = self.transport.clone();
        let listeners = self.listeners.clone();
        let trim = self.config.measurement_trim;
        let interval_ms = self.config.poll_interval_ms;

        let handle = tokio::spawn(async move {
            let creator = CommandCreator::new();
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            // A tick that overruns the interval is skipped, never queued
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        let samples = {
                            let mut transport = transport.lock();
                            poll_all_channels(&mut **transport, &creator, trim)
                        };
                        match samples {
                            Ok(samples) => {
                                let listeners: Vec<Arc<dyn InstrumentListener>> =
                                    listeners.read().values().cloned().collect();
                                for (channel, voltage, current) in samples {
                                    for listener in &listeners {
                                        listener.on_live_measurement(channel, voltage, current).await;
                                    }
                                }
                            }
                            // Abandon the tick; the next one retries
                            Err(e) => tracing::warn!("Measurement poll failed: {}", e),
                        }
                    }
                }
            }
            tracing::debug!("Measurement poll loop stopped");
        });

        self.poll_shutdown = Some(shutdown_tx);
        self.poll_task = Some(handle);
    }

    /// Stop the measurement poll task, waiting out any in-flight tick
    async fn stop_polling(&mut self) {
        if let Some(tx) = self.poll_shutdown.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.poll_task.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Poll task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::NoOpTransport;
    use async_trait::async_trait;
    use tokio::sync::Mutex as AsyncMutex;

    struct TestListener {
        calls: Arc<AsyncMutex<Vec<String>>>,
    }

    impl TestListener {
        fn new() -> Self {
            Self {
                calls: Arc::new(AsyncMutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl InstrumentListener for TestListener {
        async fn on_error(&self, message: &str) {
            let mut g = self.calls.lock().await;
            g.push(format!("error:{}", message));
        }
    }

    fn test_instrument() -> Instrument {
        Instrument::new(
            Box::new(NoOpTransport::new()),
            InstrumentConfig::default(),
            Some("test".to_string()),
        )
    }

    #[tokio::test]
    async fn test_register_unregister_listener() {
        let mut instrument = test_instrument();
        let listener = Arc::new(TestListener::new());
        let handle = instrument.register_listener(listener.clone());
        assert_eq!(instrument.listener_count(), 1);
        instrument.unregister_listener(handle);
        assert_eq!(instrument.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_is_surfaced_to_listeners() {
        let mut instrument = test_instrument();
        let listener = Arc::new(TestListener::new());
        let calls = listener.calls.clone();
        let _handle = instrument.register_listener(listener);

        let err = instrument
            .set_channel_value(1, SetpointKind::Voltage, "not a number")
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(instrument.channel_settings(), ChannelSettings::new());

        let g = calls.lock().await;
        assert!(g.iter().any(|s| s.starts_with("error:")));
    }

    #[tokio::test]
    async fn test_invalid_channel_is_rejected() {
        let mut instrument = test_instrument();
        let err = instrument
            .set_channel_value(5, SetpointKind::Voltage, "1.0")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Command(CommandError::InvalidChannel { channel: 5 })
        ));
    }

    #[tokio::test]
    async fn test_output_defaults_off_without_status() {
        let instrument = test_instrument();
        assert!(!instrument.output_enabled());
        assert!(!instrument.is_polling());
    }
}
