//! JSON wire formats of the attendance service.
//!
//! The service is loosely typed: flags arrive as `0`/`1` or booleans, times
//! with or without seconds, months as numbers or names. Parsing is tolerant of
//! those variations and strict about required fields.

use crate::error::{AttendanceError, Result};
use chrono::{Month, NaiveDate};
use prolock_core::schedule::{parse_clock_time, parse_date, parse_weekday};
use prolock_core::{
    AttendanceRecord, CardUid, DoorStatus, Identity, IdentityKey, RemoteDateTime, RemoteDoorCommand,
    ScheduleWindow,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct IdentityBody {
    #[serde(alias = "user_name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleEntry {
    day_of_the_week: Option<String>,
    specific_date: Option<String>,
    class_start: Option<String>,
    class_end: Option<String>,
    #[serde(default)]
    is_makeup_class: Value,
}

#[derive(Debug, Deserialize)]
struct DateTimeBody {
    day_of_week: Option<String>,
    #[serde(default)]
    date: Value,
    #[serde(default)]
    month: Value,
    #[serde(default)]
    year: Value,
    current_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentLogEntry {
    #[serde(rename = "UID", default)]
    uid: Value,
    #[serde(default)]
    time_in: Option<String>,
    #[serde(default)]
    time_out: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoorLogsBody {
    #[serde(default)]
    logs: Vec<Value>,
}

/// Body of `POST /door/log-status`.
#[derive(Debug, Serialize)]
pub(crate) struct DoorStatusBody<'a> {
    pub id: String,
    pub kind: &'a str,
    pub status: DoorStatus,
}

/// One entry of the remote door log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoorLogEntry {
    pub id: Option<String>,
    pub status: Option<String>,
    pub action_type: Option<String>,
}

impl DoorLogEntry {
    /// Operator command carried by this entry, if any.
    #[must_use]
    pub fn command(&self) -> Option<RemoteDoorCommand> {
        self.action_type
            .as_deref()
            .and_then(RemoteDoorCommand::from_action_type)
    }

    fn from_value(value: &Value) -> Self {
        Self {
            id: value.get("id").and_then(scalar_string),
            status: value.get("status").and_then(scalar_string),
            action_type: value.get("action_type").and_then(scalar_string),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AttendanceError::malformed(format!("missing field '{field}'")))
}

/// Interpret `0`/`1`, `true`/`false` or their string forms. Absent means `false`.
fn flag(value: &Value, field: &str) -> Result<bool> {
    let parsed = match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| AttendanceError::malformed(format!("invalid flag '{field}': {value}")))
}

fn integer(value: &Value, field: &str) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AttendanceError::malformed(format!("invalid field '{field}': {value}")))
}

fn month(value: &Value) -> Result<u32> {
    if let Value::String(s) = value
        && let Ok(month) = s.trim().parse::<Month>()
    {
        return Ok(month.number_from_month());
    }

    let number = integer(value, "month")?;
    u32::try_from(number)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| AttendanceError::malformed(format!("month out of range: {number}")))
}

pub(crate) fn parse_identity(key: IdentityKey, body: &str) -> Result<Identity> {
    let body: IdentityBody = serde_json::from_str(body)?;
    let name = required(&body.name, "name")?;
    Ok(Identity::new(key, name))
}

pub(crate) fn parse_schedule(body: &str) -> Result<Vec<ScheduleWindow>> {
    let entries: Vec<ScheduleEntry> = serde_json::from_str(body)?;

    entries
        .iter()
        .map(|entry| -> Result<ScheduleWindow> {
            let start = parse_clock_time(required(&entry.class_start, "class_start")?)?;
            let end = parse_clock_time(required(&entry.class_end, "class_end")?)?;

            if flag(&entry.is_makeup_class, "is_makeup_class")? {
                let date = parse_date(required(&entry.specific_date, "specific_date")?)?;
                Ok(ScheduleWindow::makeup(date, start, end))
            } else {
                let weekday = parse_weekday(required(&entry.day_of_the_week, "day_of_the_week")?)?;
                Ok(ScheduleWindow::weekly(weekday, start, end))
            }
        })
        .collect()
}

pub(crate) fn parse_current_date_time(body: &str) -> Result<RemoteDateTime> {
    let body: DateTimeBody = serde_json::from_str(body)?;

    let weekday = parse_weekday(required(&body.day_of_week, "day_of_week")?)?;
    let time = parse_clock_time(required(&body.current_time, "current_time")?)?;

    // Some deployments send a full ISO date in `date`, others the day of month.
    let date = match &body.date {
        Value::String(s) if s.contains('-') => parse_date(s)?,
        day => {
            let day = integer(day, "date")?;
            let month = month(&body.month)?;
            let year = integer(&body.year, "year")?;
            i32::try_from(year)
                .ok()
                .zip(u32::try_from(day).ok())
                .and_then(|(year, day)| NaiveDate::from_ymd_opt(year, month, day))
                .ok_or_else(|| {
                    AttendanceError::malformed(format!("invalid date {year}-{month}-{day}"))
                })?
        }
    };

    Ok(RemoteDateTime::new(weekday, date, time))
}

pub(crate) fn parse_records(body: &str) -> Result<Vec<AttendanceRecord>> {
    Ok(serde_json::from_str(body)?)
}

/// UIDs of open card records. Entries without a valid UID are skipped.
pub(crate) fn parse_open_card_uids(body: &str) -> Result<Vec<CardUid>> {
    let entries: Vec<RecentLogEntry> = serde_json::from_str(body)?;

    let mut uids: Vec<CardUid> = Vec::new();
    for entry in entries {
        let record = AttendanceRecord::new(entry.time_in.as_deref(), entry.time_out.as_deref());
        if !record.is_open() {
            continue;
        }
        if let Some(uid) = scalar_string(&entry.uid).and_then(|raw| CardUid::new(&raw).ok())
            && !uids.contains(&uid)
        {
            uids.push(uid);
        }
    }
    Ok(uids)
}

pub(crate) fn parse_latest_door_log(body: &str) -> Result<Option<DoorLogEntry>> {
    let body: DoorLogsBody = serde_json::from_str(body)?;
    Ok(body.logs.last().map(DoorLogEntry::from_value))
}
