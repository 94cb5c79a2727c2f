//! Mock proximity-card reader for testing and development.

use crate::{HardwareError, Result, traits::ProximityReader, types::DeviceInfo};
use prolock_core::CardUid;
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock proximity-card reader.
///
/// Cards tapped on the [`MockRfidHandle`] are returned by
/// [`read_card`](ProximityReader::read_card) in order.
#[derive(Debug)]
pub struct MockRfid {
    card_rx: mpsc::Receiver<CardUid>,

    name: String,

    fail_init: bool,
}

impl MockRfid {
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock Proximity Reader".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let (card_tx, card_rx) = mpsc::channel(32);

        let reader = Self {
            card_rx,
            name,
            fail_init: false,
        };

        (reader, MockRfidHandle { card_tx })
    }

    /// Make [`initialize`](ProximityReader::initialize) fail.
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

impl Default for MockRfid {
    fn default() -> Self {
        Self::new().0
    }
}

impl ProximityReader for MockRfid {
    async fn initialize(&mut self) -> Result<DeviceInfo> {
        if self.fail_init {
            return Err(HardwareError::initialization_failed(format!(
                "{}: reader not found",
                self.name
            )));
        }

        Ok(DeviceInfo::new(self.name.clone(), "ISO14443A").with_firmware_version("1.0.0"))
    }

    async fn read_card(&mut self, timeout: Duration) -> Result<Option<CardUid>> {
        match tokio::time::timeout(timeout, self.card_rx.recv()).await {
            Ok(Some(uid)) => Ok(Some(uid)),
            Ok(None) => Err(HardwareError::disconnected("Proximity card channel closed")),
            Err(_) => Ok(None),
        }
    }
}

/// Handle for presenting cards to a [`MockRfid`].
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    card_tx: mpsc::Sender<CardUid>,
}

impl MockRfidHandle {
    /// Present a card to the reader.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader was dropped.
    pub async fn tap(&self, uid: CardUid) -> Result<()> {
        self.card_tx
            .send(uid)
            .await
            .map_err(|_| HardwareError::disconnected("Proximity card channel closed"))
    }

    /// Present a card given as a hex string.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if `hex` is not a valid UID.
    pub async fn tap_hex(&self, hex: &str) -> Result<()> {
        let uid = CardUid::new(hex).map_err(|e| HardwareError::invalid_data(e.to_string()))?;
        self.tap(uid).await
    }
}
