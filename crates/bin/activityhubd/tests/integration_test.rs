//! End-to-end smoke tests for the full activityhubd stack.
//!
//! Each test spins up the complete application (JSON file store in a temp
//! directory, real services, real axum router) and exercises the HTTP layer
//! via `tower::ServiceExt::oneshot` — no TCP port is bound.

use std::path::Path;
use std::sync::Arc;

use activityhub_adapter_http_axum::router;
use activityhub_adapter_http_axum::state::AppState;
use activityhub_adapter_storage_json::{DEFAULT_FILE_NAME, JsonFileStore};
use activityhub_app::event_bus::InProcessEventBus;
use activityhub_app::services::activity_service::ActivityService;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a fully-wired router over the activity file in `dir`.
async fn app(dir: &Path) -> axum::Router {
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let service = Arc::new(ActivityService::new(
        JsonFileStore::in_dir(dir),
        Arc::clone(&event_bus),
    ));
    service
        .initialize()
        .await
        .expect("activity file should load");

    router::build(AppState::new(service, event_bus))
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn call_service(service: &str, data: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/services/activity_manager/{service}"))
        .header("content-type", "application/json")
        .body(Body::from(data.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let dir = tempfile::tempdir().unwrap();
    let resp = app(dir.path()).await.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_add_activity_and_expose_sensor() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let resp = app
        .clone()
        .oneshot(call_service(
            "add_activity",
            &serde_json::json!({
                "names": ["Alice", "Bob"],
                "category": "Kitchen",
                "frequency": {"days": 1},
                "last_completed": "2024-01-01T00:00:00Z"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, serde_json::json!([]));

    let resp = app
        .oneshot(get("/api/states/sensor.kitchen_alice"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let sensor = json_body(resp).await;
    assert_eq!(sensor["state"], "2024-01-02T00:00:00+00:00");
    assert_eq!(sensor["friendly_name"], "Alice");
    assert_eq!(sensor["attributes"]["frequency_ms"], 86_400_000);
    assert_eq!(sensor["attributes"]["overdue"], true);
}

#[tokio::test]
async fn should_complete_and_rotate_through_update_service() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    app.clone()
        .oneshot(call_service(
            "add_activity",
            &serde_json::json!({"names": ["Alice", "Bob"], "category": "Kitchen", "frequency": 86400}),
        ))
        .await
        .unwrap();
    let resp = app
        .clone()
        .oneshot(call_service(
            "update_activity",
            &serde_json::json!({"entity_id": "sensor.kitchen_alice", "last_completed": 1_709_287_200}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let sensor = json_body(
        app.oneshot(get("/api/states/sensor.kitchen_alice"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(sensor["friendly_name"], "Bob");
    assert_eq!(
        sensor["attributes"]["last_completed"],
        "2024-03-01T10:00:00+00:00"
    );
}

#[tokio::test]
async fn should_manage_names_through_services() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    app.clone()
        .oneshot(call_service(
            "add_activity",
            &serde_json::json!({"name": "Mow", "category": "Garden", "frequency": "7 days, 00:00:00"}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(call_service(
            "add_name",
            &serde_json::json!({"entity_id": "sensor.garden_mow", "name": "Rake"}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(call_service(
            "remove_name",
            &serde_json::json!({"entity_id": "sensor.garden_mow", "index": 0}),
        ))
        .await
        .unwrap();

    let activities = json_body(app.oneshot(get("/api/activities")).await.unwrap()).await;
    assert_eq!(activities[0]["names"], serde_json::json!(["Rake"]));
}

#[tokio::test]
async fn should_return_404_for_unknown_service() {
    let dir = tempfile::tempdir().unwrap();
    let resp = app(dir.path())
        .await
        .oneshot(call_service("explode", &serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_return_400_for_invalid_frequency() {
    let dir = tempfile::tempdir().unwrap();
    let resp = app(dir.path())
        .await
        .oneshot(call_service(
            "add_activity",
            &serde_json::json!({"name": "Mow", "frequency": "whenever"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_persist_activities_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    app(dir.path())
        .await
        .oneshot(call_service(
            "add_activity",
            &serde_json::json!({"name": "Water plants", "category": "Garden", "frequency": {"days": 3}}),
        ))
        .await
        .unwrap();
    assert!(dir.path().join(DEFAULT_FILE_NAME).exists());

    let resp = app(dir.path())
        .await
        .oneshot(get("/api/states"))
        .await
        .unwrap();
    let states = json_body(resp).await;
    assert_eq!(states.as_array().unwrap().len(), 1);
    assert_eq!(states[0]["entity_id"], "sensor.garden_water_plants");
}

#[tokio::test]
async fn should_load_legacy_activity_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_FILE_NAME),
        r#"[{
            "id": "0123456789abcdef0123456789abcdef",
            "name": "Vacuum",
            "category": "House",
            "frequency": {"days": 7},
            "last_completed": "2024-01-01T00:00:00Z"
        }]"#,
    )
    .unwrap();

    let resp = app(dir.path())
        .await
        .oneshot(get("/api/activities/0123456789abcdef0123456789abcdef"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let activity = json_body(resp).await;
    assert_eq!(activity["names"], serde_json::json!(["Vacuum"]));
    assert_eq!(activity["current_name_index"], 0);
}
