//! Hardware abstraction layer for the ProLock access session coordinator.
//!
//! This crate provides trait-based abstractions for the peripherals of one
//! door: a fingerprint sensor, a proximity-card reader and two digital outputs
//! (lock actuator and alarm buzzer). Mock implementations make it possible to
//! run the whole stack without hardware.
//!
//! # Layout
//!
//! - [`traits`]: `BiometricSensor`, `ProximityReader`, `DigitalOutput`
//! - [`devices`]: enum wrappers (`AnyBiometricSensor`, ...) for dispatch
//! - [`mock`]: mock devices, each paired with a control handle
//! - [`poller`]: `BiometricPoller` and `ProximityPoller` with `next_event()`
//! - [`control`]: `RunFlag` and the `ProximityGate`
//! - [`manager`]: `PeripheralManager` spawning one task per poller
//!
//! # Quick Start
//!
//! ```
//! use prolock_hardware::control::RunFlag;
//! use prolock_hardware::devices::AnyBiometricSensor;
//! use prolock_hardware::mock::MockBiometric;
//! use prolock_hardware::poller::{BiometricEvent, BiometricPoller};
//!
//! # #[tokio::main]
//! # async fn main() -> prolock_hardware::Result<()> {
//! let (sensor, handle) = MockBiometric::new();
//! let mut poller = BiometricPoller::new(AnyBiometricSensor::Mock(sensor), RunFlag::new());
//!
//! handle.place_finger(7, 180).await?;
//! assert!(matches!(poller.next_event().await?, BiometricEvent::Match(_)));
//! # Ok(())
//! # }
//! ```

pub mod control;
pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
pub mod poller;
pub mod traits;
pub mod types;

pub use control::{GateObserver, GateState, ProximityGate, RunFlag};
pub use devices::{AnyBiometricSensor, AnyOutput, AnyProximityReader};
pub use error::{HardwareError, Result};
pub use manager::{DeviceType, PeripheralConfig, PeripheralEvent, PeripheralHandle, PeripheralManager};
pub use poller::{BiometricEvent, BiometricPoller, CaptureStage, ProximityEvent, ProximityPoller};
pub use traits::{BiometricSensor, DigitalOutput, ProximityReader};
pub use types::{DeviceInfo, ImageStatus, OutputLevel, SearchHit, TemplateStatus};
