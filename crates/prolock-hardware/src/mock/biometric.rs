//! Mock fingerprint sensor for testing and development.
//!
//! The sensor and its handle are connected by a channel. Each call to
//! [`MockBiometricHandle::place_finger`] (or one of its siblings) queues one
//! scan; the sensor reports `NoFinger` until a scan is queued and then plays
//! it through the image → template → search cycle.

use crate::{
    HardwareError, Result,
    traits::BiometricSensor,
    types::{DeviceInfo, ImageStatus, SearchHit, TemplateStatus},
};
use prolock_core::BiometricSlot;
use tokio::sync::mpsc;

/// Outcome of one simulated finger placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockScan {
    /// Finger enrolled in `slot`.
    Enrolled {
        slot: BiometricSlot,
        confidence: u16,
    },

    /// Finger that matches no enrolled template.
    Unknown,

    /// Image captured but no template could be extracted.
    Smudged,

    /// Serial failure while reading the image.
    ReadError,
}

/// Mock fingerprint sensor.
///
/// # Examples
///
/// ```
/// use prolock_hardware::mock::MockBiometric;
/// use prolock_hardware::traits::BiometricSensor;
/// use prolock_hardware::types::ImageStatus;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (mut sensor, handle) = MockBiometric::new();
/// handle.place_finger(7, 180).await.unwrap();
///
/// assert_eq!(sensor.read_image().await.unwrap(), ImageStatus::Ready);
/// # }
/// ```
#[derive(Debug)]
pub struct MockBiometric {
    scan_rx: mpsc::Receiver<MockScan>,

    /// Scan currently on the sensor.
    current: Option<MockScan>,

    name: String,

    template_count: u16,

    fail_init: bool,
}

impl MockBiometric {
    pub fn new() -> (Self, MockBiometricHandle) {
        Self::with_name("Mock Fingerprint Sensor".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockBiometricHandle) {
        let (scan_tx, scan_rx) = mpsc::channel(32);

        let sensor = Self {
            scan_rx,
            current: None,
            name,
            template_count: 0,
            fail_init: false,
        };

        (sensor, MockBiometricHandle { scan_tx })
    }

    /// Make [`verify_connection`](BiometricSensor::verify_connection) fail.
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    #[must_use]
    pub fn with_template_count(mut self, count: u16) -> Self {
        self.template_count = count;
        self
    }
}

impl Default for MockBiometric {
    fn default() -> Self {
        Self::new().0
    }
}

impl BiometricSensor for MockBiometric {
    async fn verify_connection(&mut self) -> Result<DeviceInfo> {
        if self.fail_init {
            return Err(HardwareError::initialization_failed(format!(
                "{}: no response to handshake",
                self.name
            )));
        }

        Ok(DeviceInfo::new(self.name.clone(), "Mock Fingerprint Sensor v1.0")
            .with_firmware_version("1.0.0")
            .with_template_count(self.template_count))
    }

    async fn read_image(&mut self) -> Result<ImageStatus> {
        if self.current.is_none() {
            match self.scan_rx.try_recv() {
                Ok(scan) => self.current = Some(scan),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(ImageStatus::NoFinger),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(HardwareError::disconnected("Biometric scan channel closed"));
                }
            }
        }

        match self.current {
            Some(MockScan::ReadError) => {
                self.current = None;
                Err(HardwareError::image_acquisition("mock packet checksum mismatch"))
            }
            Some(_) => Ok(ImageStatus::Ready),
            None => Ok(ImageStatus::NoFinger),
        }
    }

    async fn image_to_template(&mut self) -> Result<TemplateStatus> {
        match self.current {
            Some(MockScan::Smudged) => {
                self.current = None;
                Ok(TemplateStatus::Failed)
            }
            Some(_) => Ok(TemplateStatus::Converted),
            None => Err(HardwareError::invalid_data("no image in buffer")),
        }
    }

    async fn search_template(&mut self) -> Result<Option<SearchHit>> {
        match self.current.take() {
            Some(MockScan::Enrolled { slot, confidence }) => {
                Ok(Some(SearchHit::new(slot, confidence)))
            }
            Some(_) => Ok(None),
            None => Err(HardwareError::invalid_data("no template in buffer")),
        }
    }
}

/// Handle for queueing scans on a [`MockBiometric`].
#[derive(Debug, Clone)]
pub struct MockBiometricHandle {
    scan_tx: mpsc::Sender<MockScan>,
}

impl MockBiometricHandle {
    /// Queue a scan of an arbitrary outcome.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the sensor was dropped.
    pub async fn queue(&self, scan: MockScan) -> Result<()> {
        self.scan_tx
            .send(scan)
            .await
            .map_err(|_| HardwareError::disconnected("Biometric scan channel closed"))
    }

    /// Queue an enrolled finger.
    pub async fn place_finger(&self, slot: BiometricSlot, confidence: u16) -> Result<()> {
        self.queue(MockScan::Enrolled { slot, confidence }).await
    }

    /// Queue a finger that is not enrolled.
    pub async fn place_unknown_finger(&self) -> Result<()> {
        self.queue(MockScan::Unknown).await
    }

    /// Queue a finger whose image cannot be templated.
    pub async fn place_smudged_finger(&self) -> Result<()> {
        self.queue(MockScan::Smudged).await
    }

    /// Queue a serial failure on the next image read.
    pub async fn inject_read_error(&self) -> Result<()> {
        self.queue(MockScan::ReadError).await
    }
}
