//! Integration tests for AttendanceClient
//!
//! These tests run the client against a canned HTTP server on a loopback
//! socket and check both the requests it sends and how it maps responses.

mod common;

use chrono::{NaiveDate, NaiveTime, Weekday};
use common::{CannedServer, Reply};
use prolock_core::{CardUid, DoorStatus, Identity, IdentityKey, RemoteDateTime, RemoteDoorCommand};
use prolock_network::{AttendanceClient, AttendanceClientConfig, AttendanceError, AttendanceService};
use std::time::Duration;

fn client_for(server: &CannedServer) -> AttendanceClient {
    AttendanceClient::new(AttendanceClientConfig {
        base_url: server.base_url.clone(),
        timeout: Duration::from_millis(1000),
    })
    .unwrap()
}

fn monday_at(h: u32, m: u32) -> RemoteDateTime {
    RemoteDateTime::new(
        Weekday::Mon,
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
        NaiveTime::from_hms_opt(h, m, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_lookup_identity() {
    let server = CannedServer::start(|_| Reply::json(r#"{"name":"Ada Lovelace"}"#)).await;
    let client = client_for(&server);

    let identity = client.lookup_identity(7).await.unwrap();
    assert_eq!(identity.display_name, "Ada Lovelace");
    assert_eq!(identity.key, IdentityKey::Biometric(7));

    let request = server.single_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path(), "/api/identity-by-biometric/7");
}

#[tokio::test]
async fn test_lookup_identity_not_found() {
    let server = CannedServer::start(|_| Reply::status(404, r#"{"detail":"Not found"}"#)).await;
    let client = client_for(&server);

    let err = client.lookup_identity(99).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_read_server_error_is_network() {
    let server = CannedServer::start(|_| Reply::status(500, "boom")).await;
    let client = client_for(&server);

    let err = client.current_date_time().await.unwrap_err();
    assert!(matches!(err, AttendanceError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_lookup_card_holder() {
    let server = CannedServer::start(|_| Reply::json(r#"{"user_name":"Grace Hopper"}"#)).await;
    let client = client_for(&server);
    let uid = CardUid::new("04:AB:CD:EF").unwrap();

    let identity = client.lookup_card_holder(&uid).await.unwrap();
    assert_eq!(identity.display_name, "Grace Hopper");
    assert!(identity.key.is_card());
    assert_eq!(server.single_request().path(), "/api/identity-by-card/04abcdef");
}

#[tokio::test]
async fn test_fetch_schedule_sends_kind() {
    let server = CannedServer::start(|_| {
        Reply::json(
            r#"[{"day_of_the_week":"Monday","class_start":"08:00","class_end":"10:00","is_makeup_class":0}]"#,
        )
    })
    .await;
    let client = client_for(&server);

    let windows = client.fetch_schedule(&IdentityKey::Biometric(3)).await.unwrap();
    assert_eq!(windows.len(), 1);
    assert!(windows[0].allows(&monday_at(9, 0)));

    let request = server.single_request();
    assert_eq!(request.path(), "/api/schedule/3");
    assert_eq!(request.query_param("kind").as_deref(), Some("fingerprint"));
}

#[tokio::test]
async fn test_current_date_time() {
    let server = CannedServer::start(|_| {
        Reply::json(
            r#"{"day_of_week":"Monday","date":2,"month":"September","year":2024,"current_time":"09:15:00"}"#,
        )
    })
    .await;
    let client = client_for(&server);

    let now = client.current_date_time().await.unwrap();
    assert_eq!(now, monday_at(9, 15));
    assert_eq!(server.single_request().path(), "/api/current-date-time");
}

#[tokio::test]
async fn test_has_open_record() {
    let server = CannedServer::start(|request| {
        if request.path().ends_with("/3") {
            Reply::json(r#"[{"time_in":"08:00","time_out":"09:00"},{"time_in":"10:00","time_out":null}]"#)
        } else {
            Reply::json(r#"[{"time_in":"08:00","time_out":"09:00"}]"#)
        }
    })
    .await;
    let client = client_for(&server);

    assert!(client.has_open_record(&IdentityKey::Biometric(3)).await.unwrap());
    assert!(!client.has_open_record(&IdentityKey::Biometric(4)).await.unwrap());

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.path().starts_with("/api/recent-logs-by-id/")));
}

#[tokio::test]
async fn test_open_card_records() {
    let server = CannedServer::start(|_| {
        Reply::json(
            r#"[{"UID":"04ABCDEF","time_in":"08:00","time_out":null},{"UID":"04112233","time_in":"08:00","time_out":"09:00"}]"#,
        )
    })
    .await;
    let client = client_for(&server);

    let uids = client.open_card_records().await.unwrap();
    assert_eq!(uids, vec![CardUid::new("04abcdef").unwrap()]);

    let request = server.single_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path(), "/api/recent-logs");
}

#[tokio::test]
async fn test_has_open_record_malformed() {
    let server = CannedServer::start(|_| Reply::json(r#"{"logs":"nope"}"#)).await;
    let client = client_for(&server);

    let err = client
        .has_open_record(&IdentityKey::Biometric(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_record_time_in_query() {
    let server = CannedServer::start(|_| Reply::json(r#"{"message":"ok"}"#)).await;
    let client = client_for(&server);
    let identity = Identity::new(IdentityKey::Biometric(5), "Ada Lovelace");

    client.record_time_in(&identity, &monday_at(8, 5)).await.unwrap();

    let request = server.single_request();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path(), "/api/logs/time-in");
    assert_eq!(request.query_param("kind").as_deref(), Some("fingerprint"));
    assert_eq!(request.query_param("id").as_deref(), Some("5"));
    assert_eq!(request.query_param("time_in").as_deref(), Some("08:05"));
    assert_eq!(request.query_param("user_name").as_deref(), Some("Ada Lovelace"));
}

#[tokio::test]
async fn test_record_time_out_query() {
    let server = CannedServer::start(|_| Reply::json("{}")).await;
    let client = client_for(&server);
    let key = IdentityKey::Card(CardUid::new("04abcdef").unwrap());

    client.record_time_out(&key, &monday_at(17, 30)).await.unwrap();

    let request = server.single_request();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path(), "/api/logs/time-out");
    assert_eq!(request.query_param("kind").as_deref(), Some("card"));
    assert_eq!(request.query_param("id").as_deref(), Some("04abcdef"));
    assert_eq!(request.query_param("time_out").as_deref(), Some("17:30"));
}

#[tokio::test]
async fn test_write_client_error_is_rejected() {
    let server = CannedServer::start(|_| Reply::status(409, "already timed in\n")).await;
    let client = client_for(&server);
    let identity = Identity::new(IdentityKey::Biometric(5), "Ada");

    let err = client
        .record_time_in(&identity, &monday_at(8, 5))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AttendanceError::Rejected {
            status: 409,
            message: "already timed in".to_string(),
        }
    );
}

#[tokio::test]
async fn test_write_server_error_is_network() {
    let server = CannedServer::start(|_| Reply::status(503, "")).await;
    let client = client_for(&server);

    let err = client
        .record_time_out(&IdentityKey::Biometric(5), &monday_at(8, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AttendanceError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_report_door_status_body() {
    let server = CannedServer::start(|_| Reply::json("{}")).await;
    let client = client_for(&server);

    client
        .report_door_status(&IdentityKey::Biometric(2), DoorStatus::Close)
        .await
        .unwrap();

    let request = server.single_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path(), "/api/door/log-status");

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"id": "2", "kind": "fingerprint", "status": "close"})
    );
}

#[tokio::test]
async fn test_latest_door_log() {
    let server = CannedServer::start(|_| {
        Reply::json(
            r#"{"logs":[{"id":10,"status":"open","action_type":"time_in"},{"id":11,"status":"open","action_type":"manual_unlock"}]}"#,
        )
    })
    .await;
    let client = client_for(&server);

    let entry = client.latest_door_log().await.unwrap().unwrap();
    assert_eq!(entry.id.as_deref(), Some("11"));
    assert_eq!(entry.command(), Some(RemoteDoorCommand::Unlock));
    assert_eq!(server.single_request().path(), "/api/logs");
}

#[tokio::test]
async fn test_request_timeout_is_network() {
    let server = CannedServer::start_delayed(Duration::from_secs(3), |_| Reply::json("{}")).await;
    let client = AttendanceClient::new(AttendanceClientConfig {
        base_url: server.base_url.clone(),
        timeout: Duration::from_millis(200),
    })
    .unwrap();

    let err = client.lookup_identity(1).await.unwrap_err();
    match err {
        AttendanceError::Network(message) => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network() {
    // Bind and drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AttendanceClient::new(AttendanceClientConfig {
        base_url: format!("http://{addr}/api"),
        timeout: Duration::from_millis(500),
    })
    .unwrap();

    let err = client.latest_door_log().await.unwrap_err();
    assert!(matches!(err, AttendanceError::Network(_)), "got {err:?}");
}
