//! Biometric and proximity pollers.
//!
//! Each poller wraps one device and exposes a single blocking operation,
//! `next_event()`, that hides the device's polling loop and returns a typed
//! outcome. The pollers never touch session state; their events are sent to
//! the coordinator by the tasks in [`manager`](crate::manager).

use crate::control::{GateObserver, RunFlag};
use crate::devices::{AnyBiometricSensor, AnyProximityReader};
use crate::traits::{BiometricSensor, ProximityReader};
use crate::types::{DeviceInfo, ImageStatus, SearchHit, TemplateStatus};
use crate::{HardwareError, Result};
use prolock_core::CardUid;
use prolock_core::constants::{
    DEFAULT_CARD_READ_TIMEOUT_MS, DEFAULT_IMAGE_POLL_INTERVAL_MS, DEFAULT_MAX_IMAGE_POLLS,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one fingerprint capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricEvent {
    /// The sensor matched an enrolled template.
    Match(SearchHit),

    /// An image was captured but could not be templated.
    TemplateFailed,

    /// The template matched no enrolled finger.
    NoMatch,

    /// A recoverable sensor I/O error interrupted the cycle.
    SensorFailed(CaptureStage),

    /// No finger was placed within the polling budget, or shutdown was requested.
    Timeout,
}

impl BiometricEvent {
    /// Returns `true` for outcomes that count as a failed authentication.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TemplateFailed | Self::NoMatch | Self::SensorFailed(_)
        )
    }
}

/// Step of the capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Image,
    Template,
    Search,
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Template => write!(f, "template"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Drives the image → template → search cycle on a fingerprint sensor.
#[derive(Debug)]
pub struct BiometricPoller {
    sensor: AnyBiometricSensor,
    poll_interval: Duration,
    max_polls: u32,
    running: RunFlag,
}

impl BiometricPoller {
    pub fn new(sensor: AnyBiometricSensor, running: RunFlag) -> Self {
        Self {
            sensor,
            poll_interval: Duration::from_millis(DEFAULT_IMAGE_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_IMAGE_POLLS,
            running,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls.max(1);
        self
    }

    #[must_use]
    pub fn running(&self) -> &RunFlag {
        &self.running
    }

    /// Check that the sensor answers.
    ///
    /// # Errors
    ///
    /// Propagates the sensor's initialization error.
    pub async fn verify(&mut self) -> Result<DeviceInfo> {
        self.sensor.verify_connection().await
    }

    /// Run one capture cycle.
    ///
    /// Polls for an image every `poll_interval`, at most `max_polls` times,
    /// checking the run flag before each poll.
    ///
    /// A recoverable I/O error at any step ends the cycle with
    /// [`BiometricEvent::SensorFailed`].
    ///
    /// # Errors
    ///
    /// Returns the sensor's error only if it is fatal (see
    /// [`HardwareError::is_fatal`]).
    pub async fn next_event(&mut self) -> Result<BiometricEvent> {
        let mut polls = 0;
        loop {
            if !self.running.is_running() {
                return Ok(BiometricEvent::Timeout);
            }

            match self.sensor.read_image().await {
                Ok(ImageStatus::Ready) => break,
                Ok(_) => {}
                Err(e) => return sensor_failure(CaptureStage::Image, e),
            }

            polls += 1;
            if polls >= self.max_polls {
                return Ok(BiometricEvent::Timeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        debug!(polls, "fingerprint_image_captured");

        match self.sensor.image_to_template().await {
            Ok(TemplateStatus::Failed) => return Ok(BiometricEvent::TemplateFailed),
            Ok(_) => {}
            Err(e) => return sensor_failure(CaptureStage::Template, e),
        }

        match self.sensor.search_template().await {
            Ok(Some(hit)) => Ok(BiometricEvent::Match(hit)),
            Ok(None) => Ok(BiometricEvent::NoMatch),
            Err(e) => sensor_failure(CaptureStage::Search, e),
        }
    }
}

/// Fatal errors propagate; anything else ends the cycle as a failure.
fn sensor_failure(stage: CaptureStage, error: HardwareError) -> Result<BiometricEvent> {
    if error.is_fatal() {
        return Err(error);
    }
    warn!(stage = %stage, error = %error, "fingerprint_capture_failed");
    Ok(BiometricEvent::SensorFailed(stage))
}

/// Outcome of one proximity read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProximityEvent {
    /// A card was read while the gate was open under `generation`.
    Card { uid: CardUid, generation: u64 },

    /// A card was read while the gate was closed; it must not be processed.
    Discarded { uid: CardUid },

    /// No card within the read timeout, or shutdown was requested.
    Timeout,
}

/// Reads cards and tags them with the gate generation.
///
/// The reader is polled whether or not the gate is open, so that a card tapped
/// while the gate is closed is consumed and dropped here rather than being
/// replayed when the gate next opens.
#[derive(Debug)]
pub struct ProximityPoller {
    reader: AnyProximityReader,
    gate: GateObserver,
    read_timeout: Duration,
    running: RunFlag,
}

impl ProximityPoller {
    pub fn new(reader: AnyProximityReader, gate: GateObserver, running: RunFlag) -> Self {
        Self {
            reader,
            gate,
            read_timeout: Duration::from_millis(DEFAULT_CARD_READ_TIMEOUT_MS),
            running,
        }
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn running(&self) -> &RunFlag {
        &self.running
    }

    /// Open the reader.
    ///
    /// # Errors
    ///
    /// Propagates the reader's initialization error.
    pub async fn verify(&mut self) -> Result<DeviceInfo> {
        self.reader.initialize().await
    }

    /// Perform one blocking read.
    ///
    /// # Errors
    ///
    /// Returns the reader's error on a transport failure.
    pub async fn next_event(&mut self) -> Result<ProximityEvent> {
        if !self.running.is_running() {
            return Ok(ProximityEvent::Timeout);
        }

        let Some(uid) = self.reader.read_card(self.read_timeout).await? else {
            return Ok(ProximityEvent::Timeout);
        };

        let gate = self.gate.state();
        if gate.open {
            Ok(ProximityEvent::Card {
                uid,
                generation: gate.generation,
            })
        } else {
            debug!(uid = %uid, "card_read_while_gate_closed");
            Ok(ProximityEvent::Discarded { uid })
        }
    }
}
