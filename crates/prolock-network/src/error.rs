//! Attendance service error taxonomy.

use thiserror::Error;

/// Result type for attendance service calls.
pub type Result<T> = std::result::Result<T, AttendanceError>;

/// Errors returned by [`AttendanceService`](crate::AttendanceService) calls.
///
/// None of these is retried automatically; the coordinator aborts the current
/// flow and surfaces the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    /// Transport failure, timeout, or a server-side (5xx) failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered 404 for the requested resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body was not valid JSON or lacked a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The service refused a submission (4xx on a write).
    #[error("Rejected by server (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl AttendanceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for AttendanceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

impl From<prolock_core::Error> for AttendanceError {
    fn from(e: prolock_core::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}
