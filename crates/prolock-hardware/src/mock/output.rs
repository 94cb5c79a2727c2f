//! Mock digital output for testing and development.
//!
//! The handle can observe the current level, drain the sequence of writes
//! and make subsequent writes fail.

use crate::{HardwareError, Result, traits::DigitalOutput, types::OutputLevel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};

/// Mock digital output pin.
#[derive(Debug)]
pub struct MockOutput {
    name: String,

    level_tx: watch::Sender<Option<OutputLevel>>,

    history_tx: mpsc::UnboundedSender<OutputLevel>,

    failing: Arc<AtomicBool>,
}

impl MockOutput {
    pub fn new(name: impl Into<String>) -> (Self, MockOutputHandle) {
        let (level_tx, level_rx) = watch::channel(None);
        let (history_tx, history_rx) = mpsc::unbounded_channel();
        let failing = Arc::new(AtomicBool::new(false));

        let output = Self {
            name: name.into(),
            level_tx,
            history_tx,
            failing: Arc::clone(&failing),
        };

        let handle = MockOutputHandle {
            level_rx,
            history_rx,
            failing,
        };

        (output, handle)
    }
}

impl DigitalOutput for MockOutput {
    async fn set_level(&mut self, level: OutputLevel) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::output(&self.name, "mock write failure"));
        }

        self.level_tx.send_replace(Some(level));
        // Handle may have been dropped; the level is still applied
        let _ = self.history_tx.send(level);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for observing a [`MockOutput`].
#[derive(Debug)]
pub struct MockOutputHandle {
    level_rx: watch::Receiver<Option<OutputLevel>>,

    history_rx: mpsc::UnboundedReceiver<OutputLevel>,

    failing: Arc<AtomicBool>,
}

impl MockOutputHandle {
    /// Last level written, or `None` if the pin was never driven.
    pub fn level(&self) -> Option<OutputLevel> {
        *self.level_rx.borrow()
    }

    /// Take every level written since the last call.
    pub fn drain_history(&mut self) -> Vec<OutputLevel> {
        let mut writes = Vec::new();
        while let Ok(level) = self.history_rx.try_recv() {
            writes.push(level);
        }
        writes
    }

    /// Make subsequent writes succeed or fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Wait until the output is driven to `level`.
    pub async fn wait_for(&mut self, level: OutputLevel) {
        // Sender lives as long as the output; an error means it was dropped
        let _ = self.level_rx.wait_for(|current| *current == Some(level)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_level_and_history() {
        let (mut output, mut handle) = MockOutput::new("lock");
        assert_eq!(handle.level(), None);

        output.set_level(OutputLevel::High).await.unwrap();
        output.set_level(OutputLevel::Low).await.unwrap();

        assert_eq!(handle.level(), Some(OutputLevel::Low));
        assert_eq!(
            handle.drain_history(),
            vec![OutputLevel::High, OutputLevel::Low]
        );
        assert!(handle.drain_history().is_empty());
        assert_eq!(output.name(), "lock");
    }

    #[tokio::test]
    async fn test_failing_write_keeps_level() {
        let (mut output, mut handle) = MockOutput::new("buzzer");
        output.set_level(OutputLevel::Low).await.unwrap();

        handle.set_failing(true);
        let err = output.set_level(OutputLevel::High).await.unwrap_err();
        assert!(matches!(err, HardwareError::Output { .. }));
        assert_eq!(handle.level(), Some(OutputLevel::Low));
        assert_eq!(handle.drain_history(), vec![OutputLevel::Low]);

        handle.set_failing(false);
        output.set_level(OutputLevel::High).await.unwrap();
        assert_eq!(handle.level(), Some(OutputLevel::High));
    }
}
