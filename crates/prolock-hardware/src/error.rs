//! Error types for hardware operations.
//!
//! Template and search failures on the fingerprint sensor are not errors: they
//! are normal capture outcomes reported through
//! [`BiometricEvent`](crate::poller::BiometricEvent). The variants below cover
//! the cases where the device itself misbehaves.

/// Result type for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is disconnected or its control channel closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Communication with the device failed.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device returned data that could not be interpreted.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device did not come up at startup.
    ///
    /// This is the only fatal hardware error: the binary reports it and exits.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Acquiring an image from the fingerprint sensor failed.
    #[error("Image acquisition error: {message}")]
    ImageAcquisition { message: String },

    /// Driving a digital output failed.
    #[error("Output error on {output}: {message}")]
    Output { output: String, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn image_acquisition(message: impl Into<String>) -> Self {
        Self::ImageAcquisition {
            message: message.into(),
        }
    }

    pub fn output(output: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Output {
            output: output.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors that make the device unusable at startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InitializationFailed { .. } | Self::Disconnected { .. }
        )
    }
}
