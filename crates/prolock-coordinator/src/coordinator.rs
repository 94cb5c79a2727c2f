//! The session coordinator actor.
//!
//! [`SessionCoordinator`] is the single task that mutates session state, the
//! failure counter and the door. Pollers only send it events; the
//! reconciliation task only sends it requests.
//!
//! # Flow
//!
//! 1. A fingerprint match resolves the identity, checks the schedule against
//!    the service's clock, then looks for an open record.
//! 2. No open record: record the time-in, unlock, open the proximity gate and
//!    wait for the card.
//! 3. Open record: record the time-out, lock, return to `Idle`. A faculty
//!    time-out also closes every card record still open on the room log.
//! 4. A card read under the current gate generation runs the same decision
//!    for the card holder. The handoff timer relocks the door if no card
//!    arrives.
//!
//! Superuser slots skip steps 1 to 3 and toggle the door instead. A slot that
//! recorded a time-in or time-out is ignored for `rescan_cooldown` afterwards.
//!
//! Every remote write happens before the matching door actuation, so a failed
//! write leaves the door as it was.

use crate::alarm::{FailureAlarm, SirenHandle};
use crate::door::DoorActuator;
use crate::error::{CoordinatorError, Result};
use crate::notice::Notice;
use crate::session::{CoordinatorConfig, Factor, Session};
use crate::state_machine::{PhaseMachine, SessionPhase, StateTransition};
use crate::timer::Timer;
use prolock_core::{
    BiometricSlot, CardUid, DoorStatus, Identity, IdentityKey, RemoteDateTime, RemoteDoorCommand,
    schedule_allows,
};
use prolock_hardware::{BiometricEvent, GateState, PeripheralEvent, PeripheralHandle, ProximityGate};
use prolock_network::{AttendanceError, AttendanceService};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Capacity of the notice broadcast channel.
const NOTICE_CAPACITY: usize = 32;

/// Timer that fired in [`SessionCoordinator::next_deadline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Relock,
    HandoffExpired,
}

pub struct SessionCoordinator<S> {
    service: S,
    config: CoordinatorConfig,
    machine: PhaseMachine,
    session: Option<Session>,
    door: DoorActuator,
    alarm: FailureAlarm,
    siren: SirenHandle,
    gate: ProximityGate,
    handoff: Timer,
    notices: broadcast::Sender<Notice>,
    recorded_at: HashMap<BiometricSlot, Instant>,
}

impl<S: AttendanceService> SessionCoordinator<S> {
    /// Assemble the coordinator.
    ///
    /// The coordinator becomes the only writer of `gate`; pollers hold
    /// observers of it.
    pub fn new(
        service: S,
        door: DoorActuator,
        siren: SirenHandle,
        gate: ProximityGate,
        config: CoordinatorConfig,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            service,
            alarm: FailureAlarm::new(config.failure_threshold),
            config,
            machine: PhaseMachine::new(),
            session: None,
            door,
            siren,
            gate,
            handoff: Timer::new(),
            notices,
            recorded_at: HashMap::new(),
        }
    }

    /// Subscribe to user-visible notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Current session phase. `Idle` between events unless a handoff is
    /// pending.
    pub fn phase(&self) -> SessionPhase {
        self.machine.current_phase()
    }

    /// The open session, if any. Only present while a flow is running or
    /// the card handoff is pending.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Door actuator, for inspecting the lock state and relock deadline.
    pub fn door(&self) -> &DoorActuator {
        &self.door
    }

    /// Proximity gate state as the pollers see it.
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Consecutive authentication failures, modulo the threshold.
    pub fn failure_count(&self) -> u32 {
        self.alarm.count()
    }

    /// Lockout is advisory: it is reported while the alarm sounds but never
    /// blocks a scan.
    pub fn is_lockout(&self) -> bool {
        self.siren.is_active()
    }

    /// Recent phase transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Whether the card handoff timer is armed.
    pub fn handoff_pending(&self) -> bool {
        self.handoff.is_armed()
    }

    /// Drive the lock output to locked before handling any event.
    ///
    /// # Errors
    ///
    /// Returns the output error; the door state is unknown in that case.
    pub async fn start(&mut self) -> Result<()> {
        self.door.lock().await?;
        info!(
            relock_after_ms = self.config.auto_relock_delay.as_millis() as u64,
            handoff_timeout_ms = self.config.handoff_timeout.as_millis() as u64,
            failure_threshold = self.alarm.threshold(),
            "coordinator_started"
        );
        Ok(())
    }

    /// Run until the peripheral tasks stop, then lock the door.
    ///
    /// Remote requests are optional; a closed `remote` channel is ignored.
    pub async fn run(
        mut self,
        peripherals: &mut PeripheralHandle,
        mut remote: mpsc::Receiver<RemoteDoorCommand>,
    ) -> Result<()> {
        self.start().await?;

        loop {
            tokio::select! {
                event = peripherals.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                Some(command) = remote.recv() => self.apply_remote(command).await,
                deadline = self.next_deadline() => self.on_deadline(deadline).await,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Handle one peripheral event to completion.
    pub async fn handle(&mut self, event: PeripheralEvent) {
        let result = match event {
            PeripheralEvent::Biometric(event) => self.on_biometric(event).await,
            PeripheralEvent::Card { uid, generation } => self.on_card(uid, generation).await,
            PeripheralEvent::DeviceError { device_type, error } => {
                warn!(device = %device_type, error = %error, "peripheral_error");
                self.notify(Notice::SensorError { message: error });
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.abort(e);
        }
    }

    /// Wait for the relock or handoff timer.
    ///
    /// Cancel-safe; pending forever while neither timer is armed.
    pub async fn next_deadline(&self) -> Deadline {
        tokio::select! {
            () = self.door.relock_due() => Deadline::Relock,
            () = self.handoff.wait() => Deadline::HandoffExpired,
        }
    }

    /// Act on a timer returned by [`next_deadline`](Self::next_deadline).
    pub async fn on_deadline(&mut self, deadline: Deadline) {
        match deadline {
            Deadline::Relock => {
                if let Ok(true) = self.door.lock().await {
                    info!("door_auto_relocked");
                }
            }
            Deadline::HandoffExpired => self.on_handoff_expired().await,
        }
    }

    /// Apply an operator command if it changes the door state.
    pub async fn apply_remote(&mut self, command: RemoteDoorCommand) {
        match command {
            RemoteDoorCommand::Unlock if self.door.is_locked() => {
                match self.door.unlock(self.config.auto_relock_delay).await {
                    Ok(()) => {
                        info!("remote_unlock_applied");
                        self.notify(Notice::DoorUnlockedRemotely);
                    }
                    Err(e) => warn!(error = %e, "remote_unlock_failed"),
                }
            }
            RemoteDoorCommand::Lock if !self.door.is_locked() => match self.door.lock().await {
                Ok(_) => {
                    info!("remote_lock_applied");
                    self.notify(Notice::DoorLockedRemotely);
                }
                Err(e) => warn!(error = %e, "remote_lock_failed"),
            },
            command => debug!(command = %command, "remote_command_already_applied"),
        }
    }

    /// Close the gate and lock the door.
    pub async fn shutdown(&mut self) {
        self.gate.close();
        self.handoff.cancel();
        self.session = None;
        if self.machine.current_phase() != SessionPhase::Idle {
            self.machine.reset();
        }

        match self.door.lock().await {
            Ok(_) => info!("coordinator_stopped"),
            Err(e) => error!(error = %e, "door_lock_on_shutdown_failed"),
        }
    }

    async fn on_biometric(&mut self, event: BiometricEvent) -> Result<()> {
        match self.machine.current_phase() {
            SessionPhase::Idle => {}
            SessionPhase::AwaitSecondary => {
                match event {
                    BiometricEvent::Match(hit) => {
                        debug!(slot = hit.slot, "fingerprint_ignored_during_handoff");
                        self.notify(Notice::HandoffInProgress);
                    }
                    event if event.is_failure() => self.record_failure(),
                    _ => {}
                }
                return Ok(());
            }
            phase => {
                warn!(phase = %phase, "biometric_event_in_unexpected_phase");
                return Ok(());
            }
        }

        if event == BiometricEvent::Timeout {
            return Ok(());
        }

        // Capturing is never observed between events; the cycle has
        // already completed when its event arrives.
        self.transition(SessionPhase::Capturing)?;

        match event {
            BiometricEvent::Match(hit) => {
                self.alarm.record_success();
                self.transition(SessionPhase::Matched)?;
                info!(slot = hit.slot, confidence = hit.confidence, "fingerprint_matched");
                self.on_match(hit.slot).await
            }
            _ => {
                self.transition(SessionPhase::Idle)?;
                self.record_failure();
                Ok(())
            }
        }
    }

    async fn on_match(&mut self, slot: BiometricSlot) -> Result<()> {
        let superuser = self.config.superuser_slots.contains(&slot);
        if !superuser && let Some(retry_in) = self.cooldown_remaining(slot) {
            info!(slot, retry_in_ms = retry_in.as_millis() as u64, "fingerprint_rescan_ignored");
            self.transition(SessionPhase::Idle)?;
            self.notify(Notice::RescanTooSoon { retry_in });
            return Ok(());
        }

        let identity = match self.service.lookup_identity(slot).await {
            Ok(identity) => identity,
            Err(AttendanceError::NotFound(_)) => {
                info!(slot, "fingerprint_not_registered");
                self.transition(SessionPhase::Idle)?;
                self.notify(Notice::UnknownFingerprint);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if superuser {
            return self.toggle_door(identity).await;
        }

        self.session = Some(Session::new(identity.clone()));
        self.transition(SessionPhase::ScheduleCheck)?;
        self.attend(identity, Factor::Fingerprint).await
    }

    /// Superuser scan, from `Matched`: flip the door without touching
    /// attendance records.
    async fn toggle_door(&mut self, identity: Identity) -> Result<()> {
        let name = identity.display_name;
        let notice = if self.door.is_locked() {
            self.door.unlock(self.config.auto_relock_delay).await?;
            self.report_status(&identity.key, DoorStatus::Open).await;
            Notice::DoorUnlocked { name }
        } else {
            self.door.lock().await?;
            self.report_status(&identity.key, DoorStatus::Close).await;
            Notice::DoorLocked { name }
        };

        info!(identity = %identity.key, locked = self.door.is_locked(), "superuser_door_toggled");
        self.transition(SessionPhase::Idle)?;
        self.notify(notice);
        Ok(())
    }

    async fn on_card(&mut self, uid: CardUid, generation: u64) -> Result<()> {
        if self.machine.current_phase() != SessionPhase::AwaitSecondary
            || !self.gate.state().is_open_for(generation)
        {
            debug!(uid = %uid, generation, "stale_card_discarded");
            return Ok(());
        }

        self.gate.close();
        self.handoff.cancel();

        let identity = match self.service.lookup_card_holder(&uid).await {
            Ok(identity) => identity,
            Err(AttendanceError::NotFound(_)) => {
                info!(uid = %uid, "card_not_registered");
                self.end_session()?;
                self.notify(Notice::CardNotRegistered);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.transition(SessionPhase::ScheduleCheck)?;
        self.attend(identity, Factor::Card).await
    }

    /// Schedule check and open-record decision, from `ScheduleCheck`.
    async fn attend(&mut self, identity: Identity, factor: Factor) -> Result<()> {
        let now = self.service.current_date_time().await?;
        let windows = self.service.fetch_schedule(&identity.key).await?;

        if !schedule_allows(&windows, &now) {
            info!(identity = %identity.key, now = %now, windows = windows.len(), "schedule_denied");
            self.transition(SessionPhase::Denied)?;
            self.end_session()?;
            self.notify(Notice::ScheduleDenied {
                name: identity.display_name,
            });
            return Ok(());
        }

        if self.service.has_open_record(&identity.key).await? {
            self.time_out(identity, now, factor).await
        } else {
            self.time_in(identity, now, factor).await
        }
    }

    async fn time_in(&mut self, identity: Identity, now: RemoteDateTime, factor: Factor) -> Result<()> {
        self.transition(SessionPhase::TimeInFlow)?;
        self.service.record_time_in(&identity, &now).await?;
        self.mark_recorded(&identity.key);

        match factor {
            Factor::Fingerprint => {
                self.door.unlock(self.config.auto_relock_delay).await?;
                self.report_status(&identity.key, DoorStatus::Open).await;

                let generation = self.gate.open();
                self.handoff.arm(self.config.handoff_timeout);
                if let Some(session) = self.session.as_mut() {
                    session.gate_generation = Some(generation);
                }
                self.transition(SessionPhase::AwaitSecondary)?;

                self.notify(Notice::TimedIn {
                    name: identity.display_name,
                });
                self.notify(Notice::PresentCard {
                    within: self.config.handoff_timeout,
                });
            }
            Factor::Card => {
                self.end_session()?;
                self.notify(Notice::TimedIn {
                    name: identity.display_name,
                });
            }
        }
        Ok(())
    }

    async fn time_out(
        &mut self,
        identity: Identity,
        now: RemoteDateTime,
        factor: Factor,
    ) -> Result<()> {
        self.transition(SessionPhase::TimeOutFlow)?;
        self.service.record_time_out(&identity.key, &now).await?;
        self.mark_recorded(&identity.key);

        self.door.lock().await?;
        self.report_status(&identity.key, DoorStatus::Close).await;
        self.gate.close();
        self.handoff.cancel();

        let closed = match factor {
            Factor::Fingerprint => self.close_card_records(&now).await,
            Factor::Card => 0,
        };

        self.end_session()?;
        self.notify(Notice::TimedOut {
            name: identity.display_name,
        });
        if closed > 0 {
            self.notify(Notice::CardRecordsClosed { count: closed });
        }
        Ok(())
    }

    /// Time out every card still open on the room log. Best-effort; returns
    /// how many records were closed.
    async fn close_card_records(&self, at: &RemoteDateTime) -> usize {
        let uids = match self.service.open_card_records().await {
            Ok(uids) => uids,
            Err(e) => {
                warn!(error = %e, "open_card_records_failed");
                return 0;
            }
        };

        let mut closed = 0;
        for uid in uids {
            let key = IdentityKey::Card(uid);
            match self.service.record_time_out(&key, at).await {
                Ok(()) => closed += 1,
                Err(e) => warn!(identity = %key, error = %e, "card_time_out_failed"),
            }
        }
        info!(closed, time_out = %at.time_hhmm(), "card_records_closed");
        closed
    }

    async fn on_handoff_expired(&mut self) {
        self.handoff.cancel();
        self.gate.close();

        if self.machine.current_phase() != SessionPhase::AwaitSecondary {
            return;
        }

        let key = self.session.as_ref().map(|s| s.identity.key.clone());
        info!(
            session = ?self.session.as_ref().map(|s| s.id),
            "handoff_expired"
        );

        if let Err(e) = self.door.lock().await {
            warn!(error = %e, "door_relock_after_handoff_failed");
        }
        if let Some(key) = &key {
            self.report_status(key, DoorStatus::Close).await;
        }

        if let Err(e) = self.end_session() {
            self.abort(e);
            return;
        }
        self.notify(Notice::HandoffExpired);
    }

    fn mark_recorded(&mut self, key: &IdentityKey) {
        if let IdentityKey::Biometric(slot) = key {
            let cooldown = self.config.rescan_cooldown;
            self.recorded_at.retain(|_, at| at.elapsed() < cooldown);
            self.recorded_at.insert(*slot, Instant::now());
        }
    }

    fn cooldown_remaining(&self, slot: BiometricSlot) -> Option<Duration> {
        let at = self.recorded_at.get(&slot)?;
        let remaining = self.config.rescan_cooldown.saturating_sub(at.elapsed());
        (!remaining.is_zero()).then_some(remaining)
    }

    fn record_failure(&mut self) {
        let fired = self.alarm.record_failure();
        let consecutive = if fired {
            self.alarm.threshold()
        } else {
            self.alarm.count()
        };
        info!(consecutive, "fingerprint_rejected");
        self.notify(Notice::ScanFailed { consecutive });

        if fired {
            warn!(threshold = self.alarm.threshold(), "failure_threshold_reached");
            self.siren.trigger();
            self.notify(Notice::Lockout);
        }
    }

    fn transition(&mut self, phase: SessionPhase) -> Result<()> {
        let transition = self.machine.transition_to(phase)?;
        debug!(from = %transition.from, to = %transition.to, "phase_transition");
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        self.transition(SessionPhase::Idle)?;
        if let Some(session) = self.session.take() {
            debug!(
                session = %session.id,
                duration_ms = session.age().as_millis() as u64,
                "session_closed"
            );
        }
        Ok(())
    }

    /// Abandon the current flow; the door keeps whatever state it has.
    fn abort(&mut self, error: CoordinatorError) {
        let phase = self.machine.current_phase();
        warn!(phase = %phase, error = %error, "session_flow_aborted");

        self.gate.close();
        self.handoff.cancel();
        self.session = None;
        if phase != SessionPhase::Idle {
            self.machine.reset();
        }

        let notice = match error {
            CoordinatorError::Attendance(e) => Notice::ServiceError {
                message: e.to_string(),
            },
            CoordinatorError::Hardware(e) => Notice::SensorError {
                message: e.to_string(),
            },
            CoordinatorError::Phase(e) => Notice::ServiceError {
                message: e.to_string(),
            },
        };
        self.notify(notice);
    }

    async fn report_status(&self, key: &IdentityKey, status: DoorStatus) {
        if let Err(e) = self.service.report_door_status(key, status).await {
            warn!(identity = %key, status = %status, error = %e, "door_status_report_failed");
        }
    }

    fn notify(&self, notice: Notice) {
        debug!(notice = %notice, "notice");
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }
}
