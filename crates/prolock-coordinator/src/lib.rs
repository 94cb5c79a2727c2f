//! Access session coordination for one ProLock door.
//!
//! This crate turns fingerprint and card events into attendance records and
//! door actuation. The [`SessionCoordinator`] is the only task that mutates
//! session state, the failure counter and the door; everything else talks to
//! it through channels.
//!
//! # Components
//!
//! - [`state_machine`]: validated [`SessionPhase`] transitions with history
//! - [`door`]: [`DoorActuator`] with a single auto-relock timer
//! - [`alarm`]: [`FailureAlarm`] counter and the [`AlarmSiren`] buzzer task
//! - [`reconcile`]: [`DoorReconciler`] turning remote operator commands into
//!   requests
//! - [`coordinator`]: the [`SessionCoordinator`] actor
//!
//! # Wiring
//!
//! ```no_run
//! use prolock_coordinator::{
//!     AlarmSiren, CoordinatorConfig, DoorActuator, DoorReconciler, SessionCoordinator,
//! };
//! use prolock_hardware::mock::{MockBiometric, MockOutput, MockRfid};
//! use prolock_hardware::{
//!     AnyBiometricSensor, AnyOutput, AnyProximityReader, BiometricPoller, PeripheralConfig,
//!     PeripheralManager, ProximityGate, ProximityPoller, RunFlag,
//! };
//! use prolock_network::{AttendanceClient, AttendanceClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CoordinatorConfig::default();
//! let running = RunFlag::new();
//! let (gate, observer) = ProximityGate::new();
//!
//! let (sensor, _finger) = MockBiometric::new();
//! let (reader, _card) = MockRfid::new();
//! let mut manager = PeripheralManager::new(PeripheralConfig::default());
//! manager.register_biometric(BiometricPoller::new(AnyBiometricSensor::Mock(sensor), running.clone()));
//! manager.register_proximity(ProximityPoller::new(AnyProximityReader::Mock(reader), observer, running.clone()));
//! manager.verify_devices().await?;
//!
//! let (lock, _) = MockOutput::new("lock");
//! let (buzzer, _) = MockOutput::new("buzzer");
//! let (siren, siren_handle) = AlarmSiren::new(AnyOutput::Mock(buzzer), config.alarm_pulses, config.alarm_pulse_interval);
//! tokio::spawn(siren.run());
//!
//! let client = AttendanceClient::new(AttendanceClientConfig::default())?;
//! let (reconciler, remote) = DoorReconciler::new(client.clone(), running.clone());
//! tokio::spawn(reconciler.run());
//!
//! let door = DoorActuator::new(AnyOutput::Mock(lock), config.lock_polarity);
//! let coordinator = SessionCoordinator::new(client, door, siren_handle, gate, config);
//!
//! let mut peripherals = manager.start();
//! coordinator.run(&mut peripherals, remote).await?;
//! peripherals.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod alarm;
pub mod coordinator;
pub mod door;
pub mod error;
pub mod notice;
pub mod reconcile;
pub mod session;
pub mod state_machine;
pub mod timer;

pub use alarm::{AlarmSiren, FailureAlarm, SirenHandle};
pub use coordinator::{Deadline, SessionCoordinator};
pub use door::DoorActuator;
pub use error::{CoordinatorError, Result};
pub use notice::Notice;
pub use reconcile::{CommandEdge, DoorReconciler};
pub use session::{CoordinatorConfig, Factor, Session};
pub use state_machine::{PhaseMachine, SessionPhase, StateTransition};
pub use timer::Timer;
