//! Schedule windows and the authorization rule applied to them.
//!
//! A schedule window is either a recurring weekly class or a one-off
//! "makeup" session on a specific calendar date. Exactly one lookup strategy
//! applies to each window, chosen by its [`Recurrence`]:
//!
//! - `Weekly(weekday)`: `weekday == now.weekday && start <= now.time < end`
//! - `Makeup(date)`: `date == now.date && start <= now.time < end`
//!
//! The current date and time always come from the remote service
//! ([`RemoteDateTime`]), never from the local clock.
//!
//! # Examples
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime, Weekday};
//! use prolock_core::{RemoteDateTime, ScheduleWindow, schedule_allows};
//!
//! let window = ScheduleWindow::weekly(
//!     Weekday::Mon,
//!     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
//! );
//! let now = RemoteDateTime::new(
//!     Weekday::Mon,
//!     NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//! );
//!
//! assert!(schedule_allows(&[window], &now));
//! ```

use crate::{Result, error::Error};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date and time as reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDateTime {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl RemoteDateTime {
    pub fn new(weekday: Weekday, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            weekday,
            date,
            time,
        }
    }

    /// Time of day formatted for log submissions (`HH:MM`).
    #[must_use]
    pub fn time_hhmm(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

impl fmt::Display for RemoteDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.weekday,
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M:%S")
        )
    }
}

/// How a schedule window recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Regular class held every week on this day.
    Weekly(Weekday),

    /// One-off makeup class held on this date only.
    Makeup(NaiveDate),
}

/// A time window during which an identity may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub recurrence: Recurrence,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleWindow {
    pub fn weekly(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            recurrence: Recurrence::Weekly(weekday),
            start,
            end,
        }
    }

    pub fn makeup(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            recurrence: Recurrence::Makeup(date),
            start,
            end,
        }
    }

    #[must_use]
    pub fn is_makeup(&self) -> bool {
        matches!(self.recurrence, Recurrence::Makeup(_))
    }

    /// Check whether `now` falls inside this window.
    ///
    /// The start bound is inclusive and the end bound exclusive.
    #[must_use]
    pub fn allows(&self, now: &RemoteDateTime) -> bool {
        let day_matches = match self.recurrence {
            Recurrence::Weekly(weekday) => weekday == now.weekday,
            Recurrence::Makeup(date) => date == now.date,
        };

        day_matches && self.start <= now.time && now.time < self.end
    }
}

/// Returns `true` if any window in `windows` allows `now`.
///
/// An empty schedule never authorizes.
#[must_use]
pub fn schedule_allows(windows: &[ScheduleWindow], now: &RemoteDateTime) -> bool {
    windows.iter().any(|window| window.allows(now))
}

/// Parse a clock time in `HH:MM` or `HH:MM:SS` form.
///
/// # Errors
/// Returns `Error::InvalidTime` if neither format matches.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| Error::InvalidTime(format!("'{s}': {e}")))
}

/// Parse a weekday name such as `Monday` or `mon`, ignoring case.
///
/// # Errors
/// Returns `Error::InvalidWeekday` for anything else.
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| Error::InvalidWeekday(s.to_string()))
}

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns `Error::InvalidDate` if the string is not a valid date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("'{s}': {e}")))
}
