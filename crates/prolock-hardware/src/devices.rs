//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn BiometricSensor>`
//! is not available. These enums give concrete dispatch instead: the pollers,
//! the door actuator and the alarm siren hold an `Any*` value and never need
//! to be generic over the device type.
//!
//! # Examples
//!
//! ```
//! use prolock_hardware::devices::AnyProximityReader;
//! use prolock_hardware::mock::MockRfid;
//!
//! let (reader, _handle) = MockRfid::new();
//! let any_reader = AnyProximityReader::Mock(reader);
//! ```

use crate::mock::{MockBiometric, MockOutput, MockRfid};
use crate::traits::{BiometricSensor, DigitalOutput, ProximityReader};
use crate::types::{DeviceInfo, ImageStatus, OutputLevel, SearchHit, TemplateStatus};
use crate::Result;
use prolock_core::CardUid;
use std::time::Duration;

/// Fingerprint sensor with enum dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBiometricSensor {
    /// Mock sensor for testing and simulation.
    Mock(MockBiometric),
}

impl BiometricSensor for AnyBiometricSensor {
    async fn verify_connection(&mut self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.verify_connection().await,
        }
    }

    async fn read_image(&mut self) -> Result<ImageStatus> {
        match self {
            Self::Mock(device) => device.read_image().await,
        }
    }

    async fn image_to_template(&mut self) -> Result<TemplateStatus> {
        match self {
            Self::Mock(device) => device.image_to_template().await,
        }
    }

    async fn search_template(&mut self) -> Result<Option<SearchHit>> {
        match self {
            Self::Mock(device) => device.search_template().await,
        }
    }
}

/// Proximity-card reader with enum dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyProximityReader {
    /// Mock reader for testing and simulation.
    Mock(MockRfid),
}

impl ProximityReader for AnyProximityReader {
    async fn initialize(&mut self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.initialize().await,
        }
    }

    async fn read_card(&mut self, timeout: Duration) -> Result<Option<CardUid>> {
        match self {
            Self::Mock(device) => device.read_card(timeout).await,
        }
    }
}

/// Digital output with enum dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyOutput {
    /// Mock output for testing and simulation.
    Mock(MockOutput),
}

impl DigitalOutput for AnyOutput {
    async fn set_level(&mut self, level: OutputLevel) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_level(level).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Mock(device) => device.name(),
        }
    }
}
