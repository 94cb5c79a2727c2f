//! Shared control signals between the coordinator and the poller tasks.
//!
//! - [`RunFlag`]: process-wide "keep running" flag, checked once per poll
//!   iteration.
//! - [`ProximityGate`]: binary signal that allows card reads to be processed.
//!   Only the owner of the `ProximityGate` can open or close it; pollers get a
//!   read-only [`GateObserver`].
//!
//! Every opening of the gate gets a new generation number. A card read carries
//! the generation it was read under, so the coordinator can reject a read that
//! belongs to a handoff that has already ended.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Cooperative shutdown flag shared by all poller loops.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// Create a flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Ask every loop holding this flag to stop after its current iteration.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateState {
    pub open: bool,

    /// Incremented every time the gate opens.
    pub generation: u64,
}

impl GateState {
    /// Returns `true` if the gate is open under `generation`.
    #[must_use]
    pub fn is_open_for(&self, generation: u64) -> bool {
        self.open && self.generation == generation
    }
}

/// Writer side of the proximity gate.
///
/// Deliberately not `Clone`: whoever owns this value is the only writer.
#[derive(Debug)]
pub struct ProximityGate {
    tx: watch::Sender<GateState>,
}

impl ProximityGate {
    /// Create a closed gate and an observer for it.
    pub fn new() -> (Self, GateObserver) {
        let (tx, rx) = watch::channel(GateState::default());
        (Self { tx }, GateObserver { rx })
    }

    /// Open the gate and return the generation of this opening.
    pub fn open(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            state.open = true;
            state.generation += 1;
            generation = state.generation;
        });
        debug!(generation, "proximity_gate_opened");
        generation
    }

    /// Close the gate. Closing a closed gate is a no-op.
    pub fn close(&self) {
        let closed = self.tx.send_if_modified(|state| {
            let was_open = state.open;
            state.open = false;
            was_open
        });
        if closed {
            debug!("proximity_gate_closed");
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        *self.tx.borrow()
    }

    /// Create another observer.
    #[must_use]
    pub fn observer(&self) -> GateObserver {
        GateObserver {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the proximity gate.
#[derive(Debug, Clone)]
pub struct GateObserver {
    rx: watch::Receiver<GateState>,
}

impl GateObserver {
    #[must_use]
    pub fn state(&self) -> GateState {
        *self.rx.borrow()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.rx.borrow().open
    }
}
