//! Peripheral task manager.
//!
//! The `PeripheralManager` owns the two pollers, spawns one task per poller
//! and funnels their events into a single channel consumed by the session
//! coordinator.
//!
//! ```text
//! ┌───────────┐
//! │ Biometric │──────►┌─────────────────┐
//! │ Task      │       │  Event Channel  │
//! └───────────┘       │  (mpsc)         │──────► SessionCoordinator
//! ┌───────────┐       │                 │
//! │ Proximity │──────►└─────────────────┘
//! │ Task      │
//! └───────────┘
//! ```
//!
//! Tasks only emit events. They never mutate session or door state.
//!
//! # Examples
//!
//! ```no_run
//! use prolock_hardware::control::{ProximityGate, RunFlag};
//! use prolock_hardware::devices::{AnyBiometricSensor, AnyProximityReader};
//! use prolock_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use prolock_hardware::mock::{MockBiometric, MockRfid};
//! use prolock_hardware::poller::{BiometricPoller, ProximityPoller};
//!
//! #[tokio::main]
//! async fn main() -> prolock_hardware::Result<()> {
//!     let running = RunFlag::new();
//!     let (_gate, observer) = ProximityGate::new();
//!
//!     let (sensor, _sensor_handle) = MockBiometric::new();
//!     let (reader, _reader_handle) = MockRfid::new();
//!
//!     let mut manager = PeripheralManager::new(PeripheralConfig::default());
//!     manager.register_biometric(BiometricPoller::new(
//!         AnyBiometricSensor::Mock(sensor),
//!         running.clone(),
//!     ));
//!     manager.register_proximity(ProximityPoller::new(
//!         AnyProximityReader::Mock(reader),
//!         observer,
//!         running.clone(),
//!     ));
//!     manager.verify_devices().await?;
//!
//!     let mut handle = manager.start();
//!     while let Some(event) = handle.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::poller::{BiometricEvent, BiometricPoller, ProximityEvent, ProximityPoller};
use crate::Result;
use prolock_core::constants::{
    DEFAULT_SENSOR_RETRY_DELAY_MS, EVENT_CHANNEL_CAPACITY, MIN_POLL_INTERVAL_MS,
};
use prolock_core::{CardUid, Config};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Unified event from the peripheral tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PeripheralEvent {
    /// Finished fingerprint capture cycle (never `Timeout`). Recoverable
    /// sensor errors arrive here as `SensorFailed`.
    Biometric(BiometricEvent),

    /// Card read while the gate was open.
    Card { uid: CardUid, generation: u64 },

    /// Fatal biometric error, or any proximity reader error. The proximity
    /// task keeps running unless the error is fatal.
    DeviceError {
        device_type: DeviceType,
        error: String,
    },
}

/// Type of peripheral device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Biometric,
    Proximity,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Biometric => write!(f, "Biometric"),
            Self::Proximity => write!(f, "Proximity"),
        }
    }
}

/// Task timing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Pause after a completed capture cycle or a device error.
    ///
    /// Gives the user time to lift the finger before the next cycle.
    pub retry_delay: Duration,

    /// Capacity of the event channel.
    pub channel_capacity: usize,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(DEFAULT_SENSOR_RETRY_DELAY_MS),
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&Config> for PeripheralConfig {
    fn from(config: &Config) -> Self {
        Self {
            retry_delay: config.sensor_retry_delay(),
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for receiving events from the peripheral tasks.
pub struct PeripheralHandle {
    event_rx: mpsc::Receiver<PeripheralEvent>,

    tasks: JoinSet<Result<()>>,
}

impl PeripheralHandle {
    /// Receive the next event.
    ///
    /// Returns `None` once every task has terminated.
    pub async fn recv(&mut self) -> Option<PeripheralEvent> {
        self.event_rx.recv().await
    }

    /// Abort all tasks and wait for them to terminate.
    ///
    /// Task errors and panics are logged, never propagated.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(error_count, panic_count, "peripheral_tasks_ended_abnormally");
        } else {
            debug!("peripheral_tasks_stopped");
        }
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

/// Owns the pollers and spawns their tasks.
pub struct PeripheralManager {
    biometric: Option<BiometricPoller>,
    proximity: Option<ProximityPoller>,
    config: PeripheralConfig,
}

impl PeripheralManager {
    pub fn new(config: PeripheralConfig) -> Self {
        Self {
            biometric: None,
            proximity: None,
            config,
        }
    }

    pub fn register_biometric(&mut self, poller: BiometricPoller) {
        self.biometric = Some(poller);
    }

    pub fn register_proximity(&mut self, poller: ProximityPoller) {
        self.proximity = Some(poller);
    }

    /// Handshake with every registered device.
    ///
    /// # Errors
    ///
    /// Returns the first device error, typically
    /// `HardwareError::InitializationFailed`.
    pub async fn verify_devices(&mut self) -> Result<()> {
        if let Some(poller) = self.biometric.as_mut() {
            let info = poller.verify().await?;
            info!(device = %info, templates = ?info.template_count, "fingerprint_sensor_ready");
        }
        if let Some(poller) = self.proximity.as_mut() {
            let info = poller.verify().await?;
            info!(device = %info, "proximity_reader_ready");
        }
        Ok(())
    }

    /// Spawn one task per registered poller.
    pub fn start(self) -> PeripheralHandle {
        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let mut tasks = JoinSet::new();

        if let Some(poller) = self.biometric {
            tasks.spawn(Self::biometric_task(
                poller,
                event_tx.clone(),
                self.config.retry_delay,
            ));
        }

        if let Some(poller) = self.proximity {
            tasks.spawn(Self::proximity_task(
                poller,
                event_tx.clone(),
                self.config.retry_delay,
            ));
        }

        PeripheralHandle { event_rx, tasks }
    }

    async fn biometric_task(
        mut poller: BiometricPoller,
        tx: mpsc::Sender<PeripheralEvent>,
        retry_delay: Duration,
    ) -> Result<()> {
        while poller.running().is_running() {
            let start = tokio::time::Instant::now();

            match poller.next_event().await {
                Ok(BiometricEvent::Timeout) => {}
                Ok(event) => {
                    if !forward(&tx, PeripheralEvent::Biometric(event)).await {
                        break;
                    }
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "fingerprint_sensor_error");
                    let event = PeripheralEvent::DeviceError {
                        device_type: DeviceType::Biometric,
                        error: e.to_string(),
                    };
                    if !forward(&tx, event).await || e.is_fatal() {
                        return Err(e);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }

            rate_limit(start).await;
        }

        debug!("biometric_task_stopped");
        Ok(())
    }

    async fn proximity_task(
        mut poller: ProximityPoller,
        tx: mpsc::Sender<PeripheralEvent>,
        retry_delay: Duration,
    ) -> Result<()> {
        while poller.running().is_running() {
            let start = tokio::time::Instant::now();

            match poller.next_event().await {
                Ok(ProximityEvent::Card { uid, generation }) => {
                    if !forward(&tx, PeripheralEvent::Card { uid, generation }).await {
                        break;
                    }
                }
                Ok(ProximityEvent::Discarded { .. } | ProximityEvent::Timeout) => {}
                Err(e) => {
                    warn!(error = %e, "proximity_reader_error");
                    let event = PeripheralEvent::DeviceError {
                        device_type: DeviceType::Proximity,
                        error: e.to_string(),
                    };
                    if !forward(&tx, event).await || e.is_fatal() {
                        return Err(e);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }

            rate_limit(start).await;
        }

        debug!("proximity_task_stopped");
        Ok(())
    }
}

/// Send an event, applying backpressure if the channel is full.
///
/// Returns `false` if the receiver is gone.
async fn forward(tx: &mpsc::Sender<PeripheralEvent>, event: PeripheralEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!("peripheral_event_channel_full");
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(event).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Cap a poller loop at 100 Hz even if the device returns immediately.
async fn rate_limit(start: tokio::time::Instant) {
    let min = Duration::from_millis(MIN_POLL_INTERVAL_MS);
    let elapsed = start.elapsed();
    if elapsed < min {
        tokio::time::sleep(min - elapsed).await;
    }
}
