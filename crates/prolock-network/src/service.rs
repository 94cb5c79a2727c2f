//! Contract of the remote attendance service.
//!
//! The service is the sole source of truth for identities, schedules and
//! attendance logs. The coordinator depends on this trait rather than on the
//! HTTP client so that tests can run against an in-memory fake.
//!
//! Methods return `impl Future + Send` so that a coordinator generic over the
//! service can still be spawned onto the Tokio runtime. Implementors can write
//! plain `async fn`.

use crate::error::Result;
use crate::wire::DoorLogEntry;
use prolock_core::{
    BiometricSlot, CardUid, DoorStatus, Identity, IdentityKey, RemoteDateTime, ScheduleWindow,
};
use std::future::Future;

pub trait AttendanceService: Send + Sync {
    /// Resolve the owner of an enrolled fingerprint slot.
    ///
    /// Fails with `NotFound` if the slot is not assigned to anyone.
    fn lookup_identity(&self, slot: BiometricSlot) -> impl Future<Output = Result<Identity>> + Send;

    /// Resolve the holder of a proximity card.
    fn lookup_card_holder(&self, uid: &CardUid) -> impl Future<Output = Result<Identity>> + Send;

    /// Fetch every schedule window of an identity.
    fn fetch_schedule(
        &self,
        key: &IdentityKey,
    ) -> impl Future<Output = Result<Vec<ScheduleWindow>>> + Send;

    /// Current date and time according to the service.
    ///
    /// Schedule decisions never use the local clock.
    fn current_date_time(&self) -> impl Future<Output = Result<RemoteDateTime>> + Send;

    /// Returns `true` iff the identity has a record with `time_in` set and
    /// `time_out` unset.
    fn has_open_record(&self, key: &IdentityKey) -> impl Future<Output = Result<bool>> + Send;

    /// Submit a time-in at the service's `HH:MM` time.
    ///
    /// The server arbitrates duplicates; a refusal surfaces as `Rejected`.
    fn record_time_in(
        &self,
        identity: &Identity,
        at: &RemoteDateTime,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Submit a time-out at the service's `HH:MM` time.
    fn record_time_out(
        &self,
        key: &IdentityKey,
        at: &RemoteDateTime,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Cards of every record on the room's recent log that is still open.
    ///
    /// A UID appears once even if it has several open records.
    fn open_card_records(&self) -> impl Future<Output = Result<Vec<CardUid>>> + Send;

    /// Post a door status line to the remote door log.
    ///
    /// Callers treat this as best-effort.
    fn report_door_status(
        &self,
        key: &IdentityKey,
        status: DoorStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Latest entry of the remote door log, if the log is not empty.
    fn latest_door_log(&self) -> impl Future<Output = Result<Option<DoorLogEntry>>> + Send;
}
