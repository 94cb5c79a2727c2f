//! Remote door command reconciliation.
//!
//! Operators can lock or unlock the door from the attendance service. The
//! [`DoorReconciler`] polls the remote door log at a low rate and forwards new
//! operator commands to the coordinator as requests. It never touches the
//! door itself; the coordinator is the only writer of door state.

use prolock_core::RemoteDoorCommand;
use prolock_core::constants::DEFAULT_RECONCILE_INTERVAL_MS;
use prolock_hardware::RunFlag;
use prolock_network::{AttendanceService, DoorLogEntry};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Capacity of the request channel to the coordinator.
pub const REMOTE_REQUEST_CAPACITY: usize = 8;

pub struct DoorReconciler<S> {
    service: S,
    interval: Duration,
    requests: mpsc::Sender<RemoteDoorCommand>,
    running: RunFlag,
    edge: CommandEdge,
}

impl<S: AttendanceService> DoorReconciler<S> {
    /// Create the reconciler and the receiver the coordinator consumes.
    pub fn new(service: S, running: RunFlag) -> (Self, mpsc::Receiver<RemoteDoorCommand>) {
        let (tx, rx) = mpsc::channel(REMOTE_REQUEST_CAPACITY);
        let reconciler = Self {
            service,
            interval: Duration::from_millis(DEFAULT_RECONCILE_INTERVAL_MS),
            requests: tx,
            running,
            edge: CommandEdge::default(),
        };
        (reconciler, rx)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until stopped or the coordinator goes away.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running.is_running() {
            ticker.tick().await;

            if let Some(command) = self.poll_once().await
                && self.requests.send(command).await.is_err()
            {
                break;
            }
        }

        debug!("door_reconciler_stopped");
    }

    /// Fetch the latest door log entry and return a command if it is new.
    ///
    /// Poll failures are logged and yield `None`.
    pub async fn poll_once(&mut self) -> Option<RemoteDoorCommand> {
        match self.service.latest_door_log().await {
            Ok(entry) => self.edge.observe(entry),
            Err(e) => {
                warn!(error = %e, "door_log_poll_failed");
                None
            }
        }
    }
}

/// Edge detection over the latest door log entry.
///
/// The first observation only sets the baseline, so a command issued before
/// startup is not replayed. Afterwards a command is reported only when the
/// latest entry changes.
#[derive(Debug, Default)]
pub struct CommandEdge {
    baseline: Option<Option<DoorLogEntry>>,
}

impl CommandEdge {
    pub fn observe(&mut self, entry: Option<DoorLogEntry>) -> Option<RemoteDoorCommand> {
        let command = entry.as_ref().and_then(DoorLogEntry::command);
        let changed = self.baseline.as_ref().map(|previous| *previous != entry);
        self.baseline = Some(entry);

        match changed {
            None => {
                debug!(latest = ?command, "door_log_baseline");
                None
            }
            Some(false) => None,
            Some(true) => {
                if let Some(command) = command {
                    info!(command = %command, "remote_door_command");
                }
                command
            }
        }
    }
}
