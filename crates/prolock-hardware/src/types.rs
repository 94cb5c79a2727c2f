//! Common types shared across hardware device implementations.

use prolock_core::BiometricSlot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device information metadata.
///
/// # Examples
///
/// ```
/// use prolock_hardware::types::DeviceInfo;
///
/// let info = DeviceInfo::new("R307", "Optical Fingerprint Sensor")
///     .with_firmware_version("1.2");
///
/// assert_eq!(info.name, "R307");
/// assert_eq!(info.firmware_version.as_deref(), Some("1.2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name.
    pub name: String,

    /// Device model.
    pub model: String,

    /// Firmware version (if available).
    pub firmware_version: Option<String>,

    /// Number of enrolled templates (fingerprint sensors only).
    pub template_count: Option<u16>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
            template_count: None,
        }
    }

    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }

    pub fn with_template_count(mut self, count: u16) -> Self {
        self.template_count = Some(count);
        self
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.model)?;
        if let Some(version) = &self.firmware_version {
            write!(f, " fw {version}")?;
        }
        Ok(())
    }
}

/// Logical level of a digital output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputLevel {
    Low,
    High,
}

impl OutputLevel {
    #[must_use]
    pub fn from_bool(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }

    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for OutputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Result of asking the fingerprint sensor for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// A finger is on the sensor and an image was captured.
    Ready,

    /// Nothing on the sensor yet.
    NoFinger,
}

/// Result of converting the captured image into a searchable template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    Converted,

    /// Image too messy or too faint to extract features from.
    Failed,
}

/// Best candidate returned by the sensor's template search.
///
/// The firmware returns at most one candidate; no ranking happens above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub slot: BiometricSlot,
    pub confidence: u16,
}

impl SearchHit {
    pub fn new(slot: BiometricSlot, confidence: u16) -> Self {
        Self { slot, confidence }
    }
}
