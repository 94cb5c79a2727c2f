//! Session phase state machine.
//!
//! The machine validates every phase change of the access session and keeps a
//! bounded history of transitions for diagnostics. It performs no I/O; the
//! [`SessionCoordinator`](crate::SessionCoordinator) drives it.
//!
//! # Phases
//!
//! - `Idle`: no session, waiting for a fingerprint
//! - `Capturing`: a fingerprint capture cycle has completed and is being handled.
//!   Transient: the coordinator enters and leaves it while handling a single
//!   biometric event, so it only ever shows up in the history.
//! - `Matched`: the sensor matched a template; the identity is being resolved
//! - `ScheduleCheck`: schedule and open-record lookups are in flight
//! - `Denied`: the schedule does not allow the identity right now
//! - `TimeInFlow`: a time-in is being recorded
//! - `TimeOutFlow`: a time-out is being recorded
//! - `AwaitSecondary`: the proximity gate is open, waiting for a card
//!
//! # Valid Transitions
//!
//! - Idle → Capturing → Matched → ScheduleCheck
//! - Capturing → Idle (template, search or sensor failure)
//! - Matched → Idle (identity not resolved, re-scan too soon, superuser toggle)
//! - ScheduleCheck → Denied → Idle
//! - ScheduleCheck → TimeInFlow → AwaitSecondary | Idle
//! - ScheduleCheck → TimeOutFlow → Idle
//! - AwaitSecondary → ScheduleCheck (card read) | Idle (handoff timeout)
//!
//! A failed remote call aborts the flow through [`PhaseMachine::reset`].
//!
//! # Examples
//!
//! ```
//! use prolock_coordinator::{PhaseMachine, SessionPhase};
//!
//! let mut machine = PhaseMachine::new();
//! assert_eq!(machine.current_phase(), SessionPhase::Idle);
//!
//! machine.transition_to(SessionPhase::Capturing).unwrap();
//! assert!(machine.transition_to(SessionPhase::TimeInFlow).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use prolock_core::{Error, Result};

/// Maximum number of transitions kept in history.
///
/// A full two-factor session is about eight transitions, so this covers the
/// last dozen sessions.
const MAX_HISTORY_SIZE: usize = 100;

/// Phase of the access session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Capturing,
    Matched,
    ScheduleCheck,
    Denied,
    TimeInFlow,
    TimeOutFlow,
    AwaitSecondary,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Capturing => "Capturing",
            SessionPhase::Matched => "Matched",
            SessionPhase::ScheduleCheck => "ScheduleCheck",
            SessionPhase::Denied => "Denied",
            SessionPhase::TimeInFlow => "TimeInFlow",
            SessionPhase::TimeOutFlow => "TimeOutFlow",
            SessionPhase::AwaitSecondary => "AwaitSecondary",
        };
        f.write_str(name)
    }
}

impl SessionPhase {
    /// Check if a transition to `target` is valid from this phase.
    ///
    /// ```
    /// use prolock_coordinator::SessionPhase;
    ///
    /// assert!(SessionPhase::Idle.can_transition_to(SessionPhase::Capturing));
    /// assert!(!SessionPhase::Idle.can_transition_to(SessionPhase::AwaitSecondary));
    /// ```
    pub fn can_transition_to(self, target: SessionPhase) -> bool {
        use SessionPhase::*;

        matches!(
            (self, target),
            (Idle, Capturing)
                | (Capturing, Matched | Idle)
                | (Matched, ScheduleCheck | Idle)
                | (ScheduleCheck, Denied | TimeInFlow | TimeOutFlow)
                | (Denied, Idle)
                | (TimeInFlow, AwaitSecondary | Idle)
                | (TimeOutFlow, Idle)
                | (AwaitSecondary, ScheduleCheck | Idle)
        )
    }

    /// Returns `true` while a session exists.
    pub fn has_session(self) -> bool {
        !matches!(self, SessionPhase::Idle | SessionPhase::Capturing)
    }
}

/// A single phase transition with timestamp.
///
/// The timestamp is not serialized; a deserialized record carries the time
/// of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionPhase,

    pub to: SessionPhase,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: SessionPhase, to: SessionPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Validating phase machine with bounded history.
///
/// Not thread-safe; it is owned by the coordinator task.
#[derive(Debug)]
pub struct PhaseMachine {
    current_phase: SessionPhase,

    phase_entered_at: Instant,

    history: VecDeque<StateTransition>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            current_phase: SessionPhase::Idle,
            phase_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_phase(&self) -> SessionPhase {
        self.current_phase
    }

    pub fn time_in_current_phase(&self) -> Duration {
        self.phase_entered_at.elapsed()
    }

    /// Transitions ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Transition to `phase`, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not valid
    /// from the current phase. The machine is left unchanged.
    pub fn transition_to(&mut self, phase: SessionPhase) -> Result<StateTransition> {
        if !self.current_phase.can_transition_to(phase) {
            return Err(Error::InvalidStateTransition {
                from: self.current_phase.to_string(),
                to: phase.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_phase, phase);
        self.apply(transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Idle`, whatever the current phase.
    ///
    /// Used when a flow is aborted by an error.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_phase, SessionPhase::Idle);
        self.apply(transition.clone());
        transition
    }

    fn apply(&mut self, transition: StateTransition) {
        self.current_phase = transition.to;
        self.phase_entered_at = transition.timestamp;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}
