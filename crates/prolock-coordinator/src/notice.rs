//! User-visible notices.
//!
//! The coordinator broadcasts a [`Notice`] for every outcome a person at the
//! door should see. Rendering (screen, speech, console) is up to the
//! subscriber.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Notice {
    /// Time-in recorded.
    TimedIn { name: String },

    /// Time-out recorded.
    TimedOut { name: String },

    /// The proximity gate is open for the card.
    PresentCard { within: Duration },

    /// No card arrived within the handoff window.
    HandoffExpired,

    /// A fingerprint was matched while a handoff is pending.
    HandoffInProgress,

    /// The same fingerprint recorded attendance too recently.
    RescanTooSoon { retry_in: Duration },

    /// A faculty time-out closed the card records left open.
    CardRecordsClosed { count: usize },

    /// Superuser unlock; no attendance recorded.
    DoorUnlocked { name: String },

    /// Superuser lock.
    DoorLocked { name: String },

    ScheduleDenied { name: String },

    UnknownFingerprint,

    CardNotRegistered,

    /// Template, search or recoverable sensor failure.
    ScanFailed { consecutive: u32 },

    /// The failure threshold was reached and the alarm is sounding.
    Lockout,

    /// A remote call failed; nothing was recorded.
    ServiceError { message: String },

    SensorError { message: String },

    DoorUnlockedRemotely,

    DoorLockedRemotely,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TimedIn { name } => write!(f, "Welcome, {name}. Time-in recorded."),
            Notice::TimedOut { name } => write!(f, "Goodbye, {name}. Time-out recorded."),
            Notice::PresentCard { within } => {
                write!(f, "Tap your card within {} seconds.", within.as_secs())
            }
            Notice::HandoffExpired => write!(f, "Card not presented in time. Door locked."),
            Notice::HandoffInProgress => write!(f, "Please tap your card first."),
            Notice::RescanTooSoon { retry_in } => write!(
                f,
                "Already recorded. Try again in {}s.",
                retry_in.as_secs().max(1)
            ),
            Notice::CardRecordsClosed { count } => {
                write!(f, "Timed out {count} open card record(s).")
            }
            Notice::DoorUnlocked { name } => write!(f, "Welcome, {name}. Door unlocked."),
            Notice::DoorLocked { name } => write!(f, "Goodbye, {name}. Door locked."),
            Notice::ScheduleDenied { name } => {
                write!(f, "Sorry {name}, you have no scheduled class right now.")
            }
            Notice::UnknownFingerprint => write!(f, "Fingerprint not registered."),
            Notice::CardNotRegistered => write!(f, "Card not registered."),
            Notice::ScanFailed { consecutive } => {
                write!(f, "Fingerprint not recognized ({consecutive}). Try again.")
            }
            Notice::Lockout => write!(f, "Too many failed attempts."),
            Notice::ServiceError { message } => write!(f, "Service unavailable: {message}"),
            Notice::SensorError { message } => write!(f, "Sensor error: {message}"),
            Notice::DoorUnlockedRemotely => write!(f, "Door unlocked remotely."),
            Notice::DoorLockedRemotely => write!(f, "Door locked remotely."),
        }
    }
}
