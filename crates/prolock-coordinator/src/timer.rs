//! One-shot deadline timer.
//!
//! A [`Timer`] holds at most one deadline. Arming it again replaces the
//! previous deadline, which is how a second unlock supersedes the first
//! relock. [`Timer::wait`] never completes while the timer is disarmed, so it
//! can sit in a `select!` loop unconditionally.
//!
//! # Examples
//!
//! ```
//! use prolock_coordinator::Timer;
//! use std::time::Duration;
//!
//! let mut timer = Timer::new();
//! assert!(!timer.is_armed());
//!
//! let deadline = timer.arm(Duration::from_secs(15));
//! assert_eq!(timer.deadline(), Some(deadline));
//!
//! assert!(timer.cancel());
//! assert_eq!(timer.remaining(), None);
//! ```

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// A disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `after` from now, replacing any pending deadline.
    pub fn arm(&mut self, after: Duration) -> Instant {
        let deadline = Instant::now() + after;
        self.deadline = Some(deadline);
        deadline
    }

    /// Disarm the timer. Returns `true` if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Whether a deadline is pending. Stays `true` after the deadline passes
    /// until the caller cancels.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if armed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Wait for the deadline.
    ///
    /// Pending forever while disarmed. The timer is not disarmed on
    /// completion; the caller cancels or re-arms it.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
