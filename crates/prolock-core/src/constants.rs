//! Core constants for the access session coordinator.
//!
//! This module centralizes the default timings and limits used when no
//! configuration file overrides them. Deployed prototypes disagreed on most
//! of these values (auto-relock delays of 5, 10, 15 and 30 seconds were all in
//! use); the defaults below are the consolidated choice and every one of them
//! can be overridden through [`Config`](crate::config::Config).
//!
//! # Usage
//!
//! ```
//! use prolock_core::constants::*;
//! use std::time::Duration;
//!
//! let relock = Duration::from_millis(DEFAULT_AUTO_RELOCK_DELAY_MS);
//! assert_eq!(relock, Duration::from_secs(10));
//! assert_eq!(DEFAULT_FAILURE_THRESHOLD, 3);
//! ```

// ============================================================================
// Card identifiers
// ============================================================================

/// Minimum UID length in bytes (per ISO 14443 specification).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443 specification).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Remote service
// ============================================================================

/// Default base URL of the attendance service.
pub const DEFAULT_SERVICE_BASE_URL: &str = "https://prolocklogger.pro/api";

/// Default timeout for a single HTTP request in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Interval between polls of the remote door command log in milliseconds.
pub const DEFAULT_RECONCILE_INTERVAL_MS: u64 = 10_000;

// ============================================================================
// Door
// ============================================================================

/// Time the door stays unlocked before relocking itself, in milliseconds.
pub const DEFAULT_AUTO_RELOCK_DELAY_MS: u64 = 10_000;

// ============================================================================
// Session
// ============================================================================

/// Window for presenting the proximity card after a fingerprint time-in.
///
/// Observed values ranged from 5 to 30 seconds.
pub const DEFAULT_HANDOFF_TIMEOUT_MS: u64 = 15_000;

/// Consecutive sensor failures that trigger the alarm.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Delay before the fingerprint poller retries after a failed read.
pub const DEFAULT_SENSOR_RETRY_DELAY_MS: u64 = 3_000;

/// Minimum delay before the same fingerprint can start another session.
/// Zero disables the cooldown.
pub const DEFAULT_RESCAN_COOLDOWN_MS: u64 = 120_000;

// ============================================================================
// Alarm
// ============================================================================

/// Number of on/off cycles in one alarm sequence.
pub const DEFAULT_ALARM_PULSES: u32 = 50;

/// Duration of each half of an alarm pulse in milliseconds.
pub const DEFAULT_ALARM_PULSE_INTERVAL_MS: u64 = 100;

// ============================================================================
// Polling
// ============================================================================

/// Interval between "is a finger on the sensor" checks in milliseconds.
pub const DEFAULT_IMAGE_POLL_INTERVAL_MS: u64 = 100;

/// Image checks performed before a capture cycle reports a timeout.
pub const DEFAULT_MAX_IMAGE_POLLS: u32 = 50;

/// Timeout passed to a single blocking card read in milliseconds.
pub const DEFAULT_CARD_READ_TIMEOUT_MS: u64 = 1_000;

/// Minimum delay between iterations of a poller loop in milliseconds.
///
/// Caps each loop at 100 Hz even if the device returns immediately.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Capacity of the coordinator's event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
