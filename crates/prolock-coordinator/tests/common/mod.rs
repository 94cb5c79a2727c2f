//! Shared fixtures for coordinator integration tests.
//!
//! [`FakeService`] is an in-memory attendance service that records every call
//! and can be told to fail individual operations. [`Harness`] wires a
//! coordinator to it with mock outputs.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime, Weekday};
use prolock_coordinator::{AlarmSiren, CoordinatorConfig, DoorActuator, Notice, SessionCoordinator};
use prolock_core::{
    BiometricSlot, CardUid, DoorStatus, Identity, IdentityKey, RemoteDateTime, ScheduleWindow,
};
use prolock_hardware::mock::{MockOutput, MockOutputHandle};
use prolock_hardware::{
    AnyOutput, BiometricEvent, CaptureStage, PeripheralEvent, ProximityGate, SearchHit,
};
use prolock_network::{AttendanceError, AttendanceService, DoorLogEntry, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// One call received by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LookupIdentity(BiometricSlot),
    LookupCardHolder(String),
    FetchSchedule(IdentityKey),
    CurrentDateTime,
    HasOpenRecord(IdentityKey),
    OpenCardRecords,
    TimeIn(IdentityKey, String),
    TimeOut(IdentityKey, String),
    DoorStatus(IdentityKey, DoorStatus),
    LatestDoorLog,
}

/// Operation the fake can be told to fail with a network error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    LookupIdentity,
    CurrentDateTime,
    FetchSchedule,
    HasOpenRecord,
    OpenCardRecords,
    TimeIn,
    TimeOut,
    DoorStatus,
    DoorLog,
}

#[derive(Debug)]
struct State {
    fingerprints: HashMap<BiometricSlot, String>,
    cards: HashMap<String, String>,
    schedules: HashMap<IdentityKey, Vec<ScheduleWindow>>,
    now: RemoteDateTime,
    open: HashSet<IdentityKey>,
    failing: HashSet<Op>,
    door_log: Option<DoorLogEntry>,
    calls: Vec<Call>,
}

#[derive(Debug, Clone)]
pub struct FakeService {
    state: Arc<Mutex<State>>,
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Monday 2024-09-02 at `h:m`.
pub fn monday_at(h: u32, m: u32) -> RemoteDateTime {
    RemoteDateTime::new(
        Weekday::Mon,
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
        hm(h, m),
    )
}

/// Weekly Monday window from 08:00 to 17:00.
pub fn monday_class() -> Vec<ScheduleWindow> {
    vec![ScheduleWindow::weekly(Weekday::Mon, hm(8, 0), hm(17, 0))]
}

impl FakeService {
    /// Service with fingerprint slot 1 → "Ada Lovelace", card `04abcdef` →
    /// "Ada Card", Monday 09:00, and a Monday class for every identity.
    pub fn new() -> Self {
        let mut fingerprints = HashMap::new();
        fingerprints.insert(1, "Ada Lovelace".to_string());
        fingerprints.insert(2, "Grace Hopper".to_string());

        let mut cards = HashMap::new();
        cards.insert("04abcdef".to_string(), "Ada Card".to_string());

        Self {
            state: Arc::new(Mutex::new(State {
                fingerprints,
                cards,
                schedules: HashMap::new(),
                now: monday_at(9, 0),
                open: HashSet::new(),
                failing: HashSet::new(),
                door_log: None,
                calls: Vec::new(),
            })),
        }
    }

    pub fn set_schedule(&self, key: IdentityKey, windows: Vec<ScheduleWindow>) {
        self.state.lock().unwrap().schedules.insert(key, windows);
    }

    pub fn set_now(&self, now: RemoteDateTime) {
        self.state.lock().unwrap().now = now;
    }

    pub fn open_record(&self, key: IdentityKey) {
        self.state.lock().unwrap().open.insert(key);
    }

    pub fn has_open(&self, key: &IdentityKey) -> bool {
        self.state.lock().unwrap().open.contains(key)
    }

    pub fn fail(&self, op: Op) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().unwrap().failing.remove(&op);
    }

    pub fn set_door_log(&self, entry: Option<DoorLogEntry>) {
        self.state.lock().unwrap().door_log = entry;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.lock().unwrap().calls)
    }

    /// Only the time-in and time-out calls, in order.
    pub fn records(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::TimeIn(..) | Call::TimeOut(..)))
            .collect()
    }

    fn enter(&self, call: Call, op: Option<Op>) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(op) = op
            && state.failing.contains(&op)
        {
            return Err(AttendanceError::network(format!("{op:?} unavailable")));
        }
        Ok(state)
    }
}

impl AttendanceService for FakeService {
    async fn lookup_identity(&self, slot: BiometricSlot) -> Result<Identity> {
        let state = self.enter(Call::LookupIdentity(slot), Some(Op::LookupIdentity))?;
        state
            .fingerprints
            .get(&slot)
            .map(|name| Identity::new(IdentityKey::Biometric(slot), name.clone()))
            .ok_or_else(|| AttendanceError::NotFound(format!("/identity-by-biometric/{slot}")))
    }

    async fn lookup_card_holder(&self, uid: &CardUid) -> Result<Identity> {
        let state = self.enter(Call::LookupCardHolder(uid.to_string()), None)?;
        state
            .cards
            .get(uid.as_str())
            .map(|name| Identity::new(IdentityKey::Card(uid.clone()), name.clone()))
            .ok_or_else(|| AttendanceError::NotFound(format!("/identity-by-card/{uid}")))
    }

    async fn fetch_schedule(&self, key: &IdentityKey) -> Result<Vec<ScheduleWindow>> {
        let state = self.enter(Call::FetchSchedule(key.clone()), Some(Op::FetchSchedule))?;
        Ok(state.schedules.get(key).cloned().unwrap_or_else(monday_class))
    }

    async fn current_date_time(&self) -> Result<RemoteDateTime> {
        let state = self.enter(Call::CurrentDateTime, Some(Op::CurrentDateTime))?;
        Ok(state.now)
    }

    async fn has_open_record(&self, key: &IdentityKey) -> Result<bool> {
        let state = self.enter(Call::HasOpenRecord(key.clone()), Some(Op::HasOpenRecord))?;
        Ok(state.open.contains(key))
    }

    async fn record_time_in(&self, identity: &Identity, at: &RemoteDateTime) -> Result<()> {
        let mut state = self.enter(
            Call::TimeIn(identity.key.clone(), at.time_hhmm()),
            Some(Op::TimeIn),
        )?;
        state.open.insert(identity.key.clone());
        Ok(())
    }

    async fn record_time_out(&self, key: &IdentityKey, at: &RemoteDateTime) -> Result<()> {
        let mut state = self.enter(Call::TimeOut(key.clone(), at.time_hhmm()), Some(Op::TimeOut))?;
        state.open.remove(key);
        Ok(())
    }

    async fn open_card_records(&self) -> Result<Vec<CardUid>> {
        let state = self.enter(Call::OpenCardRecords, Some(Op::OpenCardRecords))?;
        let mut uids: Vec<CardUid> = state
            .open
            .iter()
            .filter_map(|key| match key {
                IdentityKey::Card(uid) => Some(uid.clone()),
                IdentityKey::Biometric(_) => None,
            })
            .collect();
        uids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(uids)
    }

    async fn report_door_status(&self, key: &IdentityKey, status: DoorStatus) -> Result<()> {
        self.enter(Call::DoorStatus(key.clone(), status), Some(Op::DoorStatus))?;
        Ok(())
    }

    async fn latest_door_log(&self) -> Result<Option<DoorLogEntry>> {
        let state = self.enter(Call::LatestDoorLog, Some(Op::DoorLog))?;
        Ok(state.door_log.clone())
    }
}

pub fn fingerprint(slot: BiometricSlot) -> PeripheralEvent {
    PeripheralEvent::Biometric(BiometricEvent::Match(SearchHit::new(slot, 150)))
}

pub fn no_match() -> PeripheralEvent {
    PeripheralEvent::Biometric(BiometricEvent::NoMatch)
}

pub fn sensor_failed(stage: CaptureStage) -> PeripheralEvent {
    PeripheralEvent::Biometric(BiometricEvent::SensorFailed(stage))
}

pub fn card(hex: &str, generation: u64) -> PeripheralEvent {
    PeripheralEvent::Card {
        uid: CardUid::new(hex).unwrap(),
        generation,
    }
}

pub fn ada() -> IdentityKey {
    IdentityKey::Biometric(1)
}

pub fn ada_card() -> IdentityKey {
    IdentityKey::Card(CardUid::new("04abcdef").unwrap())
}

pub fn grace() -> IdentityKey {
    IdentityKey::Biometric(2)
}

pub fn student_card(hex: &str) -> IdentityKey {
    IdentityKey::Card(CardUid::new(hex).unwrap())
}

pub fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        auto_relock_delay: Duration::from_secs(10),
        handoff_timeout: Duration::from_secs(15),
        alarm_pulses: 3,
        alarm_pulse_interval: Duration::from_millis(100),
        rescan_cooldown: Duration::ZERO,
        ..CoordinatorConfig::default()
    }
}

pub struct Harness {
    pub coordinator: SessionCoordinator<FakeService>,
    pub service: FakeService,
    pub lock: MockOutputHandle,
    pub buzzer: MockOutputHandle,
    pub notices: broadcast::Receiver<Notice>,
}

impl Harness {
    /// Started coordinator with a running siren. Must be created inside a
    /// Tokio runtime.
    pub async fn new(config: CoordinatorConfig) -> Self {
        let service = FakeService::new();
        let (lock_output, mut lock) = MockOutput::new("lock");
        let (buzzer_output, buzzer) = MockOutput::new("buzzer");

        let (siren, siren_handle) = AlarmSiren::new(
            AnyOutput::Mock(buzzer_output),
            config.alarm_pulses,
            config.alarm_pulse_interval,
        );
        tokio::spawn(siren.run());

        let (gate, _observer) = ProximityGate::new();
        let door = DoorActuator::new(AnyOutput::Mock(lock_output), config.lock_polarity);
        let mut coordinator =
            SessionCoordinator::new(service.clone(), door, siren_handle, gate, config);
        let notices = coordinator.subscribe();

        coordinator.start().await.unwrap();
        lock.drain_history();

        Self {
            coordinator,
            service,
            lock,
            buzzer,
            notices,
        }
    }

    pub async fn with_defaults() -> Self {
        Self::new(test_config()).await
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }
}
