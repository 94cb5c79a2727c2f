//! Consecutive-failure alarm.
//!
//! [`FailureAlarm`] is the counter; it lives inside the coordinator.
//! [`AlarmSiren`] is a separate task owning the buzzer output, so that a
//! pulse sequence never delays session handling. The coordinator keeps a
//! [`SirenHandle`] to trigger it.

use prolock_core::constants::{
    DEFAULT_ALARM_PULSE_INTERVAL_MS, DEFAULT_ALARM_PULSES, DEFAULT_FAILURE_THRESHOLD,
};
use prolock_hardware::{AnyOutput, DigitalOutput, OutputLevel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Counter of consecutive authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAlarm {
    count: u32,
    threshold: u32,
}

impl FailureAlarm {
    /// A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Count a failure.
    ///
    /// Returns `true` iff this failure reaches the threshold; the counter is
    /// then reset to zero.
    pub fn record_failure(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn record_success(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for FailureAlarm {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

/// Buzzer task playing the alarm pulse sequence.
#[derive(Debug)]
pub struct AlarmSiren {
    output: AnyOutput,
    pulses: u32,
    pulse_interval: Duration,
    triggers: mpsc::Receiver<()>,
    active: Arc<AtomicBool>,
}

/// Trigger side of an [`AlarmSiren`].
#[derive(Debug, Clone)]
pub struct SirenHandle {
    triggers: mpsc::Sender<()>,
    active: Arc<AtomicBool>,
}

impl AlarmSiren {
    /// Create the siren and its handle.
    ///
    /// Each sequence is `pulses` cycles of `pulse_interval` on, then
    /// `pulse_interval` off.
    pub fn new(output: AnyOutput, pulses: u32, pulse_interval: Duration) -> (Self, SirenHandle) {
        let (tx, rx) = mpsc::channel(1);
        let active = Arc::new(AtomicBool::new(false));

        let siren = Self {
            output,
            pulses,
            pulse_interval,
            triggers: rx,
            active: Arc::clone(&active),
        };

        (siren, SirenHandle { triggers: tx, active })
    }

    pub fn with_defaults(output: AnyOutput) -> (Self, SirenHandle) {
        Self::new(
            output,
            DEFAULT_ALARM_PULSES,
            Duration::from_millis(DEFAULT_ALARM_PULSE_INTERVAL_MS),
        )
    }

    /// Play a sequence per trigger until every handle is dropped.
    ///
    /// Triggers that arrive while a sequence plays are folded into it.
    pub async fn run(mut self) {
        self.silence().await;

        while self.triggers.recv().await.is_some() {
            self.active.store(true, Ordering::SeqCst);
            info!(pulses = self.pulses, "alarm_sequence_started");

            self.play().await;

            let mut coalesced = 0u32;
            while self.triggers.try_recv().is_ok() {
                coalesced += 1;
            }
            self.active.store(false, Ordering::SeqCst);
            info!(coalesced, "alarm_sequence_finished");
        }

        self.silence().await;
        debug!("alarm_siren_stopped");
    }

    async fn play(&mut self) {
        for pulse in 0..self.pulses {
            if let Err(e) = self.output.set_level(OutputLevel::High).await {
                warn!(pulse, error = %e, "alarm_output_failed");
                break;
            }
            tokio::time::sleep(self.pulse_interval).await;

            if let Err(e) = self.output.set_level(OutputLevel::Low).await {
                warn!(pulse, error = %e, "alarm_output_failed");
                break;
            }
            tokio::time::sleep(self.pulse_interval).await;
        }

        self.silence().await;
    }

    async fn silence(&mut self) {
        if let Err(e) = self.output.set_level(OutputLevel::Low).await {
            warn!(error = %e, "alarm_output_failed");
        }
    }
}

impl SirenHandle {
    /// Request a pulse sequence.
    ///
    /// Returns `false` if the request was folded into a pending one or the
    /// siren task is gone.
    pub fn trigger(&self) -> bool {
        match self.triggers.try_send(()) {
            Ok(()) => {
                self.active.store(true, Ordering::SeqCst);
                true
            }
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Closed(())) => {
                warn!("alarm_siren_unavailable");
                false
            }
        }
    }

    /// Returns `true` from a successful trigger until its sequence finishes.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
