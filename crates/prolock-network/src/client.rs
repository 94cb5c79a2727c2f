//! HTTP/JSON client for the attendance service.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `lookup_identity` | `GET /identity-by-biometric/{slot}` |
//! | `lookup_card_holder` | `GET /identity-by-card/{uid}` |
//! | `fetch_schedule` | `GET /schedule/{id}?kind=` |
//! | `current_date_time` | `GET /current-date-time` |
//! | `has_open_record` | `GET /recent-logs-by-id/{id}?kind=` |
//! | `open_card_records` | `GET /recent-logs` |
//! | `record_time_in` | `PUT /logs/time-in?kind=&id=&time_in=&user_name=` |
//! | `record_time_out` | `PUT /logs/time-out?kind=&id=&time_out=` |
//! | `report_door_status` | `POST /door/log-status` with `{id, kind, status}` |
//! | `latest_door_log` | `GET /logs` |
//!
//! # Status mapping
//!
//! - Reads: 404 → `NotFound`, any other non-2xx → `Network`.
//! - Writes: 4xx → `Rejected` with the response body, 5xx → `Network`.
//! - Transport failures and timeouts → `Network`.
//!
//! The client never retries. The coordinator decides what a failure means.
//!
//! # Example
//!
//! ```no_run
//! use prolock_network::{AttendanceClient, AttendanceClientConfig, AttendanceService};
//! use std::time::Duration;
//!
//! # async fn example() -> prolock_network::Result<()> {
//! let client = AttendanceClient::new(AttendanceClientConfig {
//!     base_url: "https://prolocklogger.pro/api".to_string(),
//!     timeout: Duration::from_secs(5),
//! })?;
//!
//! let identity = client.lookup_identity(7).await?;
//! println!("Hello, {}", identity.display_name);
//! # Ok(())
//! # }
//! ```

use crate::error::{AttendanceError, Result};
use crate::service::AttendanceService;
use crate::wire::{self, DoorLogEntry, DoorStatusBody};
use prolock_core::constants::{DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVICE_BASE_URL};
use prolock_core::{
    BiometricSlot, CardUid, Config, DoorStatus, Identity, IdentityKey, RemoteDateTime,
    ScheduleWindow,
};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceClientConfig {
    /// Base URL without trailing slash, e.g. `https://prolocklogger.pro/api`.
    pub base_url: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for AttendanceClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl From<&Config> for AttendanceClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.service.base_url.clone(),
            timeout: config.request_timeout(),
        }
    }
}

/// HTTP implementation of [`AttendanceService`].
#[derive(Debug, Clone)]
pub struct AttendanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl AttendanceClient {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::Network` if the TLS backend cannot be set up.
    pub fn new(config: AttendanceClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AttendanceError::network(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        debug!(
            base_url = %base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "attendance_client_created"
        );

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let start = Instant::now();
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "attendance_request_failed");
                AttendanceError::from(e)
            })?;

        let status = response.status();
        debug!(
            path,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "attendance_get"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(AttendanceError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(AttendanceError::network(format!("GET {path}: HTTP {status}")));
        }

        Ok(response.text().await?)
    }

    async fn send_write(&self, path: &str, request: reqwest::RequestBuilder) -> Result<()> {
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "attendance_request_failed");
            AttendanceError::from(e)
        })?;

        let status = response.status();
        debug!(
            path,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "attendance_write"
        );

        if status.is_success() {
            return Ok(());
        }

        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(AttendanceError::Rejected {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        Err(AttendanceError::network(format!("{path}: HTTP {status}")))
    }

    fn key_query(key: &IdentityKey) -> Vec<(&'static str, String)> {
        vec![("kind", key.kind().to_string())]
    }
}

impl AttendanceService for AttendanceClient {
    async fn lookup_identity(&self, slot: BiometricSlot) -> Result<Identity> {
        let body = self
            .get_text(&format!("/identity-by-biometric/{slot}"), &[])
            .await?;
        wire::parse_identity(IdentityKey::Biometric(slot), &body)
    }

    async fn lookup_card_holder(&self, uid: &CardUid) -> Result<Identity> {
        let body = self.get_text(&format!("/identity-by-card/{uid}"), &[]).await?;
        wire::parse_identity(IdentityKey::Card(uid.clone()), &body)
    }

    async fn fetch_schedule(&self, key: &IdentityKey) -> Result<Vec<ScheduleWindow>> {
        let body = self
            .get_text(&format!("/schedule/{}", key.value()), &Self::key_query(key))
            .await?;
        wire::parse_schedule(&body)
    }

    async fn current_date_time(&self) -> Result<RemoteDateTime> {
        let body = self.get_text("/current-date-time", &[]).await?;
        wire::parse_current_date_time(&body)
    }

    async fn has_open_record(&self, key: &IdentityKey) -> Result<bool> {
        let body = self
            .get_text(
                &format!("/recent-logs-by-id/{}", key.value()),
                &Self::key_query(key),
            )
            .await?;
        Ok(wire::parse_records(&body)?.iter().any(|r| r.is_open()))
    }

    async fn open_card_records(&self) -> Result<Vec<CardUid>> {
        let body = self.get_text("/recent-logs", &[]).await?;
        let uids = wire::parse_open_card_uids(&body)?;
        debug!(open = uids.len(), "open_card_records_fetched");
        Ok(uids)
    }

    async fn record_time_in(&self, identity: &Identity, at: &RemoteDateTime) -> Result<()> {
        let path = "/logs/time-in";
        let mut query = Self::key_query(&identity.key);
        query.push(("id", identity.key.value()));
        query.push(("time_in", at.time_hhmm()));
        query.push(("user_name", identity.display_name.clone()));

        let request = self.http.put(self.url(path)).query(&query);
        self.send_write(path, request).await?;

        info!(identity = %identity.key, time_in = %at.time_hhmm(), "time_in_recorded");
        Ok(())
    }

    async fn record_time_out(&self, key: &IdentityKey, at: &RemoteDateTime) -> Result<()> {
        let path = "/logs/time-out";
        let mut query = Self::key_query(key);
        query.push(("id", key.value()));
        query.push(("time_out", at.time_hhmm()));

        let request = self.http.put(self.url(path)).query(&query);
        self.send_write(path, request).await?;

        info!(identity = %key, time_out = %at.time_hhmm(), "time_out_recorded");
        Ok(())
    }

    async fn report_door_status(&self, key: &IdentityKey, status: DoorStatus) -> Result<()> {
        let path = "/door/log-status";
        let body = DoorStatusBody {
            id: key.value(),
            kind: key.kind(),
            status,
        };

        let request = self.http.post(self.url(path)).json(&body);
        self.send_write(path, request).await?;

        debug!(identity = %key, status = %status, "door_status_reported");
        Ok(())
    }

    async fn latest_door_log(&self) -> Result<Option<DoorLogEntry>> {
        let body = self.get_text("/logs", &[]).await?;
        wire::parse_latest_door_log(&body)
    }
}
