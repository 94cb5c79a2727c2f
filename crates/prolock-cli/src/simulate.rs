//! Bench mode: mock devices driven by commands on stdin.

use prolock_core::{BiometricSlot, CardUid};
use prolock_hardware::RunFlag;
use prolock_hardware::mock::{MockBiometricHandle, MockRfidHandle};
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Confidence reported for `finger <slot>` without an explicit value.
const DEFAULT_CONFIDENCE: u16 = 200;

pub const HELP: &str = "\
commands:
  finger <slot> [confidence]  enrolled finger on the sensor
  unknown                     finger that matches no template
  smudge                      finger whose image cannot be templated
  readerror                   serial failure on the next image read
  card <hex>                  tap a proximity card
  help                        show this list
  quit                        stop the coordinator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    Finger {
        slot: BiometricSlot,
        confidence: u16,
    },
    Unknown,
    Smudge,
    ReadError,
    Card(CardUid),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{0}' takes no arguments")]
    NoArguments(String),

    #[error("invalid card UID: {0}")]
    Card(String),
}

impl FromStr for SimCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseCommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        let usage = |command, expected| ParseCommandError::Usage { command, expected };

        match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("finger", [slot]) => Ok(SimCommand::Finger {
                slot: slot.parse().map_err(|_| usage("finger", "a slot number"))?,
                confidence: DEFAULT_CONFIDENCE,
            }),
            ("finger", [slot, confidence]) => Ok(SimCommand::Finger {
                slot: slot.parse().map_err(|_| usage("finger", "a slot number"))?,
                confidence: confidence
                    .parse()
                    .map_err(|_| usage("finger", "a numeric confidence"))?,
            }),
            ("finger", _) => Err(usage("finger", "<slot> [confidence]")),
            ("card", [hex]) => CardUid::new(hex)
                .map(SimCommand::Card)
                .map_err(|e| ParseCommandError::Card(e.to_string())),
            ("card", _) => Err(usage("card", "<hex>")),
            ("unknown", []) => Ok(SimCommand::Unknown),
            ("smudge", []) => Ok(SimCommand::Smudge),
            ("readerror", []) => Ok(SimCommand::ReadError),
            ("help" | "?", []) => Ok(SimCommand::Help),
            ("quit" | "exit", []) => Ok(SimCommand::Quit),
            (other @ ("unknown" | "smudge" | "readerror" | "help" | "quit" | "exit"), _) => {
                Err(ParseCommandError::NoArguments(other.to_string()))
            }
            (other, _) => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

/// Mock device handles driven by the command loop.
#[derive(Debug, Clone)]
pub struct SimDevices {
    pub finger: MockBiometricHandle,
    pub card: MockRfidHandle,
}

/// Read commands until `quit`, end of input, or shutdown.
///
/// Stops `running` on exit so the poller tasks wind down.
pub async fn drive<R>(input: R, devices: SimDevices, running: RunFlag)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!("{HELP}");

    while running.is_running() {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin_read_failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<SimCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!(command = ?command, "sim_command");

        let result = match command {
            SimCommand::Finger { slot, confidence } => {
                devices.finger.place_finger(slot, confidence).await
            }
            SimCommand::Unknown => devices.finger.place_unknown_finger().await,
            SimCommand::Smudge => devices.finger.place_smudged_finger().await,
            SimCommand::ReadError => devices.finger.inject_read_error().await,
            SimCommand::Card(uid) => devices.card.tap(uid).await,
            SimCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            SimCommand::Quit => break,
        };

        if let Err(e) = result {
            warn!(error = %e, "sim_device_unavailable");
            break;
        }
    }

    info!("simulation_input_closed");
    running.stop();
}
