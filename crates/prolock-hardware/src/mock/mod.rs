//! Mock device implementations for testing and development.
//!
//! Each mock is created together with a handle that drives or observes it,
//! so tests and the `--simulate` mode can exercise the full stack without
//! physical hardware.

pub mod biometric;
pub mod output;
pub mod rfid;

pub use biometric::{MockBiometric, MockBiometricHandle, MockScan};
pub use output::{MockOutput, MockOutputHandle};
pub use rfid::{MockRfid, MockRfidHandle};
