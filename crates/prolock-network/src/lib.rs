//! Remote attendance service access for ProLock.
//!
//! This crate talks HTTP/JSON to the attendance service that owns identities,
//! schedules, attendance logs and the door command log. It has no knowledge of
//! sessions or hardware.
//!
//! # Components
//!
//! - **AttendanceService**: the contract the coordinator depends on
//! - **AttendanceClient**: the `reqwest` implementation of that contract
//! - **AttendanceError**: network, not-found, malformed and rejected outcomes
//!
//! # Example
//!
//! ```no_run
//! use prolock_network::{AttendanceClient, AttendanceClientConfig, AttendanceService};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AttendanceClient::new(AttendanceClientConfig {
//!     base_url: "http://127.0.0.1:8000/api".to_string(),
//!     timeout: Duration::from_millis(3000),
//! })?;
//!
//! let now = client.current_date_time().await?;
//! println!("service time {now}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod service;
mod wire;

pub use client::{AttendanceClient, AttendanceClientConfig};
pub use error::{AttendanceError, Result};
pub use service::AttendanceService;
pub use wire::DoorLogEntry;
