//! Session record and coordinator settings.

use prolock_core::constants::{
    DEFAULT_ALARM_PULSE_INTERVAL_MS, DEFAULT_ALARM_PULSES, DEFAULT_AUTO_RELOCK_DELAY_MS,
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_HANDOFF_TIMEOUT_MS, DEFAULT_RECONCILE_INTERVAL_MS,
    DEFAULT_RESCAN_COOLDOWN_MS,
};
use prolock_core::{BiometricSlot, Config, Identity, LockPolarity};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Ephemeral access session, owned by the coordinator.
///
/// Created on a resolved fingerprint match and dropped when the flow returns
/// to `Idle`. The phase lives in the coordinator's phase machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub identity: Identity,
    pub opened_at: Instant,

    /// Gate generation of the pending handoff, once the gate is open.
    pub gate_generation: Option<u64>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            opened_at: Instant::now(),
            gate_generation: None,
        }
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }
}

/// Which factor produced the identity being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Fingerprint,
    Card,
}

/// Timings and policy of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub auto_relock_delay: Duration,
    pub handoff_timeout: Duration,
    pub failure_threshold: u32,
    pub lock_polarity: LockPolarity,
    pub alarm_pulses: u32,
    pub alarm_pulse_interval: Duration,
    pub reconcile_interval: Duration,

    /// Slots that toggle the door instead of recording attendance.
    pub superuser_slots: Vec<BiometricSlot>,

    /// How long a slot is ignored after recording a time-in or time-out.
    pub rescan_cooldown: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auto_relock_delay: Duration::from_millis(DEFAULT_AUTO_RELOCK_DELAY_MS),
            handoff_timeout: Duration::from_millis(DEFAULT_HANDOFF_TIMEOUT_MS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            lock_polarity: LockPolarity::default(),
            alarm_pulses: DEFAULT_ALARM_PULSES,
            alarm_pulse_interval: Duration::from_millis(DEFAULT_ALARM_PULSE_INTERVAL_MS),
            reconcile_interval: Duration::from_millis(DEFAULT_RECONCILE_INTERVAL_MS),
            superuser_slots: Vec::new(),
            rescan_cooldown: Duration::from_millis(DEFAULT_RESCAN_COOLDOWN_MS),
        }
    }
}

impl From<&Config> for CoordinatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            auto_relock_delay: config.auto_relock_delay(),
            handoff_timeout: config.handoff_timeout(),
            failure_threshold: config.session.failure_threshold,
            lock_polarity: config.door.lock_polarity,
            alarm_pulses: config.alarm.pulses,
            alarm_pulse_interval: config.alarm_pulse_interval(),
            reconcile_interval: config.reconcile_interval(),
            superuser_slots: config.session.superuser_slots.clone(),
            rescan_cooldown: config.rescan_cooldown(),
        }
    }
}
