//! Door lock actuator with auto-relock.
//!
//! [`DoorActuator`] owns the lock output and the single relock timer. Its
//! `is_locked()` is the last successfully commanded state; there is no
//! physical feedback from the lock.

use crate::timer::Timer;
use prolock_core::LockPolarity;
use prolock_hardware::{AnyOutput, DigitalOutput, OutputLevel, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Delay before retrying a relock whose output write failed.
const RELOCK_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct DoorActuator {
    output: AnyOutput,
    polarity: LockPolarity,
    locked: bool,
    relock: Timer,
}

impl DoorActuator {
    /// Wrap the lock output.
    ///
    /// The door counts as locked until told otherwise; call [`lock`](Self::lock)
    /// once at startup to drive the output to a known level.
    pub fn new(output: AnyOutput, polarity: LockPolarity) -> Self {
        Self {
            output,
            polarity,
            locked: true,
            relock: Timer::new(),
        }
    }

    fn level(&self, locked: bool) -> OutputLevel {
        OutputLevel::from_bool(locked == self.polarity.locked_is_high())
    }

    /// Drive the output to locked and cancel any pending relock.
    ///
    /// Idempotent. Returns `true` if the door was unlocked before the call.
    ///
    /// # Errors
    ///
    /// Returns the output error. The door keeps its previous state and a
    /// pending relock is retried shortly.
    pub async fn lock(&mut self) -> Result<bool> {
        let level = self.level(true);
        if let Err(e) = self.output.set_level(level).await {
            if self.relock.is_armed() || !self.locked {
                self.relock.arm(RELOCK_RETRY_DELAY);
            }
            warn!(output = self.output.name(), error = %e, "door_lock_failed");
            return Err(e);
        }

        self.relock.cancel();
        let was_unlocked = !self.locked;
        self.locked = true;

        if was_unlocked {
            info!(level = %level, "door_locked");
        } else {
            debug!("door_lock_reasserted");
        }
        Ok(was_unlocked)
    }

    /// Drive the output to unlocked and (re)arm the relock timer.
    ///
    /// A later `unlock` replaces the pending relock.
    ///
    /// # Errors
    ///
    /// Returns the output error; the door stays in its previous state.
    pub async fn unlock(&mut self, relock_after: Duration) -> Result<()> {
        let level = self.level(false);
        self.output.set_level(level).await?;

        self.locked = false;
        self.relock.arm(relock_after);
        info!(
            level = %level,
            relock_after_ms = relock_after.as_millis() as u64,
            "door_unlocked"
        );
        Ok(())
    }

    /// Last successfully commanded state. Starts `true`.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// When the pending auto-relock fires, if one is armed.
    ///
    /// # Examples
    ///
    /// ```
    /// use prolock_coordinator::DoorActuator;
    /// use prolock_core::LockPolarity;
    /// use prolock_hardware::AnyOutput;
    /// use prolock_hardware::mock::MockOutput;
    ///
    /// let (output, _handle) = MockOutput::new("lock");
    /// let door = DoorActuator::new(AnyOutput::Mock(output), LockPolarity::ActiveHigh);
    /// assert!(door.is_locked());
    /// assert_eq!(door.relock_deadline(), None);
    /// ```
    pub fn relock_deadline(&self) -> Option<Instant> {
        self.relock.deadline()
    }

    /// Completes when the relock timer expires. Never completes while no
    /// relock is pending.
    pub async fn relock_due(&self) {
        self.relock.wait().await;
    }
}
