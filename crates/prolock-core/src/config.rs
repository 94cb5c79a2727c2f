//! Configuration loading from TOML files.
//!
//! Every section and field is optional; anything left out takes the default
//! from [`constants`](crate::constants). A missing file is not an error when
//! loaded through [`Config::load_from_path`], which falls back to defaults.
//!
//! ```toml
//! [service]
//! base_url = "https://prolocklogger.pro/api"
//! request_timeout_ms = 5000
//!
//! [door]
//! auto_relock_delay_ms = 10000
//! lock_polarity = "active_high"
//! reconcile_interval_ms = 10000
//!
//! [session]
//! handoff_timeout_ms = 15000
//! failure_threshold = 3
//! sensor_retry_delay_ms = 3000
//! rescan_cooldown_ms = 120000
//! superuser_slots = [1, 2]
//!
//! [alarm]
//! pulses = 50
//! pulse_interval_ms = 100
//!
//! [biometric]
//! image_poll_interval_ms = 100
//! max_image_polls = 50
//!
//! [proximity]
//! read_timeout_ms = 1000
//! ```

use crate::constants::*;
use crate::{BiometricSlot, Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Which output level holds the door locked.
///
/// Deployed wiring differs between sites: some solenoids lock on a high
/// output, others on a low one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockPolarity {
    /// High output = locked.
    #[default]
    ActiveHigh,

    /// Low output = locked.
    ActiveLow,
}

impl LockPolarity {
    /// Returns `true` if a high output level means "locked".
    #[must_use]
    pub fn locked_is_high(self) -> bool {
        matches!(self, LockPolarity::ActiveHigh)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    pub auto_relock_delay_ms: u64,
    pub lock_polarity: LockPolarity,
    pub reconcile_interval_ms: u64,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            auto_relock_delay_ms: DEFAULT_AUTO_RELOCK_DELAY_MS,
            lock_polarity: LockPolarity::default(),
            reconcile_interval_ms: DEFAULT_RECONCILE_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub handoff_timeout_ms: u64,
    pub failure_threshold: u32,
    pub sensor_retry_delay_ms: u64,
    pub rescan_cooldown_ms: u64,

    /// Fingerprint slots that toggle the door without any attendance record.
    pub superuser_slots: Vec<BiometricSlot>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handoff_timeout_ms: DEFAULT_HANDOFF_TIMEOUT_MS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            sensor_retry_delay_ms: DEFAULT_SENSOR_RETRY_DELAY_MS,
            rescan_cooldown_ms: DEFAULT_RESCAN_COOLDOWN_MS,
            superuser_slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub pulses: u32,
    pub pulse_interval_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            pulses: DEFAULT_ALARM_PULSES,
            pulse_interval_ms: DEFAULT_ALARM_PULSE_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiometricConfig {
    pub image_poll_interval_ms: u64,
    pub max_image_polls: u32,
}

impl Default for BiometricConfig {
    fn default() -> Self {
        Self {
            image_poll_interval_ms: DEFAULT_IMAGE_POLL_INTERVAL_MS,
            max_image_polls: DEFAULT_MAX_IMAGE_POLLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub read_timeout_ms: u64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_CARD_READ_TIMEOUT_MS,
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub door: DoorConfig,
    pub session: SessionConfig,
    pub alarm: AlarmConfig,
    pub biometric: BiometricConfig,
    pub proximity: ProximityConfig,
}

impl Config {
    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` for malformed TOML and `Error::Config`
    /// if a value fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise the errors of
    /// [`Config::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    ///
    /// A file that exists but does not parse is still an error.
    ///
    /// # Errors
    /// Returns the errors of [`Config::from_file`] except for a missing file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), "config_loaded");
                Ok(config)
            }
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config_file_missing_using_defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let base = self.service.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "service.base_url must be an absolute http(s) URL, got '{base}'"
            )));
        }

        let positive = [
            ("service.request_timeout_ms", self.service.request_timeout_ms),
            ("door.auto_relock_delay_ms", self.door.auto_relock_delay_ms),
            ("door.reconcile_interval_ms", self.door.reconcile_interval_ms),
            ("session.handoff_timeout_ms", self.session.handoff_timeout_ms),
            ("alarm.pulse_interval_ms", self.alarm.pulse_interval_ms),
            (
                "biometric.image_poll_interval_ms",
                self.biometric.image_poll_interval_ms,
            ),
            ("proximity.read_timeout_ms", self.proximity.read_timeout_ms),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{key} must be greater than zero")));
        }

        if self.session.failure_threshold == 0 {
            return Err(Error::Config(
                "session.failure_threshold must be at least 1".to_string(),
            ));
        }

        if self.biometric.max_image_polls == 0 {
            return Err(Error::Config(
                "biometric.max_image_polls must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.service.request_timeout_ms)
    }

    #[must_use]
    pub fn auto_relock_delay(&self) -> Duration {
        Duration::from_millis(self.door.auto_relock_delay_ms)
    }

    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.door.reconcile_interval_ms)
    }

    #[must_use]
    pub fn handoff_timeout(&self) -> Duration {
        Duration::from_millis(self.session.handoff_timeout_ms)
    }

    #[must_use]
    pub fn sensor_retry_delay(&self) -> Duration {
        Duration::from_millis(self.session.sensor_retry_delay_ms)
    }

    #[must_use]
    pub fn rescan_cooldown(&self) -> Duration {
        Duration::from_millis(self.session.rescan_cooldown_ms)
    }

    #[must_use]
    pub fn alarm_pulse_interval(&self) -> Duration {
        Duration::from_millis(self.alarm.pulse_interval_ms)
    }

    #[must_use]
    pub fn image_poll_interval(&self) -> Duration {
        Duration::from_millis(self.biometric.image_poll_interval_ms)
    }

    #[must_use]
    pub fn card_read_timeout(&self) -> Duration {
        Duration::from_millis(self.proximity.read_timeout_ms)
    }
}
