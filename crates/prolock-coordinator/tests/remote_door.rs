//! Operator commands from the remote door log.

mod common;

use common::*;
use prolock_coordinator::{Deadline, DoorReconciler, Notice, SessionPhase};
use prolock_core::RemoteDoorCommand;
use prolock_hardware::{OutputLevel, RunFlag};
use prolock_network::DoorLogEntry;
use std::time::Duration;
use tokio::time::Instant;

fn entry(id: &str, action_type: &str) -> Option<DoorLogEntry> {
    Some(DoorLogEntry {
        id: Some(id.to_string()),
        status: Some("open".to_string()),
        action_type: Some(action_type.to_string()),
    })
}

#[tokio::test(start_paused = true)]
async fn test_remote_unlock_arms_relock() {
    let mut h = Harness::with_defaults().await;
    let start = Instant::now();

    h.coordinator.apply_remote(RemoteDoorCommand::Unlock).await;

    assert!(!h.coordinator.door().is_locked());
    assert_eq!(h.lock.level(), Some(OutputLevel::Low));
    assert_eq!(h.drain_notices(), vec![Notice::DoorUnlockedRemotely]);

    let deadline = h.coordinator.next_deadline().await;
    assert_eq!(deadline, Deadline::Relock);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    h.coordinator.on_deadline(deadline).await;
    assert!(h.coordinator.door().is_locked());
}

#[tokio::test(start_paused = true)]
async fn test_remote_commands_apply_only_on_change() {
    let mut h = Harness::with_defaults().await;

    h.coordinator.apply_remote(RemoteDoorCommand::Lock).await;
    assert!(h.lock.drain_history().is_empty());

    h.coordinator.apply_remote(RemoteDoorCommand::Unlock).await;
    h.coordinator.apply_remote(RemoteDoorCommand::Unlock).await;
    h.coordinator.apply_remote(RemoteDoorCommand::Lock).await;

    assert_eq!(
        h.lock.drain_history(),
        vec![OutputLevel::Low, OutputLevel::High]
    );
    assert_eq!(
        h.drain_notices(),
        vec![Notice::DoorUnlockedRemotely, Notice::DoorLockedRemotely]
    );
}

#[tokio::test(start_paused = true)]
async fn test_remote_lock_leaves_session_alone() {
    let mut h = Harness::with_defaults().await;
    h.coordinator.handle(fingerprint(1)).await;

    h.coordinator.apply_remote(RemoteDoorCommand::Lock).await;

    assert!(h.coordinator.door().is_locked());
    assert_eq!(h.coordinator.phase(), SessionPhase::AwaitSecondary);
    assert!(h.coordinator.handoff_pending());
}

#[tokio::test(start_paused = true)]
async fn test_failed_remote_unlock_keeps_door_locked() {
    let mut h = Harness::with_defaults().await;
    h.lock.set_failing(true);

    h.coordinator.apply_remote(RemoteDoorCommand::Unlock).await;

    assert!(h.coordinator.door().is_locked());
    assert!(h.drain_notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconciler_reports_new_commands_only() {
    let service = FakeService::new();
    service.set_door_log(entry("1", "manual_unlock"));
    let (mut reconciler, _requests) = DoorReconciler::new(service.clone(), RunFlag::new());

    // The command that predates startup is only the baseline
    assert_eq!(reconciler.poll_once().await, None);

    service.set_door_log(entry("2", "time_in"));
    assert_eq!(reconciler.poll_once().await, None);

    service.set_door_log(entry("3", "manual_lock"));
    assert_eq!(reconciler.poll_once().await, Some(RemoteDoorCommand::Lock));
    assert_eq!(reconciler.poll_once().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_reconciler_survives_poll_failure() {
    let service = FakeService::new();
    let (mut reconciler, _requests) = DoorReconciler::new(service.clone(), RunFlag::new());
    assert_eq!(reconciler.poll_once().await, None);

    service.fail(Op::DoorLog);
    service.set_door_log(entry("4", "manual_unlock"));
    assert_eq!(reconciler.poll_once().await, None);

    service.recover(Op::DoorLog);
    assert_eq!(
        reconciler.poll_once().await,
        Some(RemoteDoorCommand::Unlock)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reconciler_task_forwards_requests() {
    let service = FakeService::new();
    let running = RunFlag::new();
    let (reconciler, mut requests) = DoorReconciler::new(service.clone(), running.clone());
    let task = tokio::spawn(reconciler.with_interval(Duration::from_secs(1)).run());

    // First tick takes the baseline
    tokio::time::sleep(Duration::from_millis(500)).await;
    service.set_door_log(entry("9", "manual_unlock"));

    let command = tokio::time::timeout(Duration::from_secs(5), requests.recv())
        .await
        .expect("reconciler should forward the command");
    assert_eq!(command, Some(RemoteDoorCommand::Unlock));

    running.stop();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("reconciler should stop")
        .unwrap();
}
