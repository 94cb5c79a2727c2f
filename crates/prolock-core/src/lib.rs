pub mod config;
pub mod constants;
pub mod error;
pub mod schedule;
pub mod types;

pub use config::{Config, LockPolarity};
pub use error::{Error, Result};
pub use schedule::{Recurrence, RemoteDateTime, ScheduleWindow, schedule_allows};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
