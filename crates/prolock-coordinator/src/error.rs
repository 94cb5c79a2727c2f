//! Coordinator error type.

use prolock_hardware::HardwareError;
use prolock_network::AttendanceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Failure that aborts the current session flow.
///
/// None of these is fatal to the coordinator; the flow returns to `Idle` and
/// the next event is handled normally.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Attendance service error: {0}")]
    Attendance(#[from] AttendanceError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Phase(#[from] prolock_core::Error),
}
