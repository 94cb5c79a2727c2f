//! Hardware device trait definitions.
//!
//! These traits are the boundary between the session coordinator and the
//! physical peripherals: one fingerprint sensor, one proximity-card reader and
//! two digital outputs (lock actuator and alarm buzzer). Template matching and
//! the card radio protocol live below this boundary, in vendor firmware.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT).
//! They are not object-safe; use generic parameters or the enum wrappers in
//! [`devices`](crate::devices) for dispatch.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, ImageStatus, OutputLevel, SearchHit, TemplateStatus};
use prolock_core::CardUid;
use std::time::Duration;

/// Fingerprint sensor with on-board template storage and search.
///
/// A capture cycle is three calls: [`read_image`](Self::read_image) until it
/// reports [`ImageStatus::Ready`], then
/// [`image_to_template`](Self::image_to_template), then
/// [`search_template`](Self::search_template).
///
/// # Examples
///
/// ```no_run
/// use prolock_hardware::traits::BiometricSensor;
/// use prolock_hardware::types::{ImageStatus, TemplateStatus};
/// use prolock_hardware::Result;
///
/// async fn capture_once<S: BiometricSensor>(sensor: &mut S) -> Result<Option<u16>> {
///     while sensor.read_image().await? == ImageStatus::NoFinger {}
///     if sensor.image_to_template().await? == TemplateStatus::Failed {
///         return Ok(None);
///     }
///     Ok(sensor.search_template().await?.map(|hit| hit.slot))
/// }
/// ```
pub trait BiometricSensor: Send + Sync {
    /// Handshake with the sensor and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InitializationFailed` if the sensor does not
    /// answer or rejects the handshake.
    async fn verify_connection(&mut self) -> Result<DeviceInfo>;

    /// Try to capture an image of a finger on the sensor.
    ///
    /// # Errors
    ///
    /// Returns an error on a serial or packet failure.
    async fn read_image(&mut self) -> Result<ImageStatus>;

    /// Convert the last captured image into a template in the sensor buffer.
    async fn image_to_template(&mut self) -> Result<TemplateStatus>;

    /// Search the enrolled templates for the buffered template.
    ///
    /// Returns `None` if nothing matched.
    async fn search_template(&mut self) -> Result<Option<SearchHit>>;
}

/// Proximity-card reader.
pub trait ProximityReader: Send + Sync {
    /// Open the reader and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InitializationFailed` if the reader is absent.
    async fn initialize(&mut self) -> Result<DeviceInfo>;

    /// Block until a card is presented or `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader disconnects or returns a malformed UID.
    async fn read_card(&mut self, timeout: Duration) -> Result<Option<CardUid>>;
}

/// Single digital output pin.
pub trait DigitalOutput: Send + Sync {
    /// Drive the output to `level`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Output` if the pin cannot be written.
    async fn set_level(&mut self, level: OutputLevel) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str;
}
