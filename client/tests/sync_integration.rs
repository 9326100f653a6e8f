//! End-to-end tests for the HTTP record store and sync controller
//!
//! Drives the real reqwest client against a wiremock server speaking the
//! remote store's envelope shapes, including the sloppy ones.

use std::sync::Arc;
use trackwell_client::api::{HttpRecordStore, Mutation, RecordDraft};
use trackwell_client::config::ApiConfig;
use trackwell_client::error::ClientError;
use trackwell_client::session::Session;
use trackwell_client::sync::{cancel_pair, CancelToken, SyncController};
use trackwell_shared::decode::DecodeOptions;
use trackwell_shared::record::ActivityKind;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> HttpRecordStore {
    let config = ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    };
    let session = Arc::new(Session::with_token("token-123"));
    HttpRecordStore::new(&config, session, DecodeOptions::default()).unwrap()
}

fn water_draft(value: f64) -> RecordDraft {
    RecordDraft::new(
        ActivityKind::WaterIntake,
        value,
        Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
    )
    .with_metadata("time", "08:00")
}

#[tokio::test]
async fn fetch_decodes_tolerant_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/activities/data"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weights": [
                {"id": 1, "activity_type": "weight", "value": "70.5",
                 "date": "2024-03-05T08:00:00.000000Z", "unit": "kg",
                 "additional_data": null}
            ],
            "waterIntakes": [
                {"id": 2, "activity_type": "water_intake", "value": 250,
                 "date": "2024-03-05", "unit": "ml",
                 "additional_data": "{\"time\":\"08:00\"}"}
            ],
            "todayWaterIntake": "250",
            "waterIntakeGoal": "2000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let snapshot = controller.refresh(&CancelToken::never()).await.unwrap();

    assert_eq!(snapshot.weights.len(), 1);
    assert_eq!(snapshot.weights[0].value, 70.5);
    assert_eq!(snapshot.water_intakes[0].time_of_day(), Some("08:00"));
    assert_eq!(snapshot.today_water_intake, Some(250.0));
    assert_eq!(snapshot.water_goal, 2000.0);
}

#[tokio::test]
async fn create_triggers_exactly_one_refetch_and_refetch_wins() {
    let server = MockServer::start().await;

    // The mutation ack deliberately reports a different goal than the
    // refetch, so the assertion below can tell the two snapshots apart.
    Mock::given(method("POST"))
        .and(path("/user/activities/water_intake"))
        .and(header("authorization", "Bearer token-123"))
        .and(body_partial_json(json!({
            "activity_type": "water_intake",
            "value": 250.0,
            "unit": "ml",
            "additional_data": "{\"time\":\"08:00\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "waterIntakes": [],
            "waterIntakeGoal": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/activities/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "waterIntakes": [
                {"id": 7, "activity_type": "water_intake", "value": 250,
                 "date": "2024-03-05T08:00:00.000000Z", "unit": "ml"}
            ],
            "waterIntakeGoal": 2000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let snapshot = controller
        .mutate(Mutation::Create(water_draft(250.0)), &CancelToken::never())
        .await
        .unwrap();

    // The reported record set is the refetch payload, never a local merge
    // of old state plus the mutation ack.
    assert_eq!(snapshot.water_goal, 2000.0);
    assert_eq!(snapshot.water_intakes.len(), 1);
    assert_eq!(snapshot.water_intakes[0].id, 7);
}

#[tokio::test]
async fn delete_hits_the_record_url_then_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/user/activities/water_intake/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "waterIntakes": [],
            "waterIntakeGoal": 2000
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/activities/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "waterIntakes": [],
            "waterIntakeGoal": 2000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let snapshot = controller
        .mutate(
            Mutation::Delete {
                id: 12,
                kind: ActivityKind::WaterIntake,
            },
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert!(snapshot.water_intakes.is_empty());
}

#[tokio::test]
async fn expired_session_surfaces_unauthorized_without_refetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/activities/weight"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Unauthenticated."
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/activities/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let err = controller
        .mutate(
            Mutation::Create(RecordDraft::new(
                ActivityKind::Weight,
                70.5,
                Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
            )),
            &CancelToken::never(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized));
    assert!(err.needs_reauthentication());
}

#[tokio::test]
async fn rejection_message_reaches_the_caller_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/activities/water_intake"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The value field must be at least 1."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let err = controller
        .mutate(Mutation::Create(water_draft(250.0)), &CancelToken::never())
        .await
        .unwrap_err();

    match err {
        ClientError::ServerRejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "The value field must be at least 1.");
        }
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn unstructured_error_body_passes_through_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/activities/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gateway exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let controller = SyncController::new(store_for(&server));
    let err = controller.refresh(&CancelToken::never()).await.unwrap_err();

    match err {
        ClientError::ServerRejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "gateway exploded");
        }
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn cancelled_mutation_never_reaches_the_wire() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail the test through
    // the received-request assertion below.

    let controller = SyncController::new(store_for(&server));
    let (handle, token) = cancel_pair();
    handle.cancel();

    let err = controller
        .mutate(Mutation::Create(water_draft(250.0)), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}
