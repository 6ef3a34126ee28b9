//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. A real driver task runs behind the router with
//! a manual clock, so no wall time is involved.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use groundops_core::{ManualClock, NotificationBus, Scheduler, SimulationDriver};
use groundops_observer::router::build_router;
use groundops_observer::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

const SCENARIO: &str = r#"{
    "id": "taxi-check",
    "name": "Taxi check",
    "initialState": {
        "aircraft": [{"id": "ac-1", "callsign": "UAL234"}],
        "runways": [{"id": "rwy-1", "name": "09L"}]
    },
    "timeline": [
        {"id": "e1", "timestamp": 1000, "type": "weather-update", "parameters": {"visibility": 2.0}}
    ]
}"#;

fn make_router() -> Router {
    let bus = NotificationBus::new(64);
    let scheduler = Scheduler::new(Arc::new(ManualClock::new()), bus.clone());
    let (handle, _join) = SimulationDriver::spawn(scheduler, 100, 16);
    build_router(Arc::new(AppState::new(handle, bus)))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(router, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn status_starts_stopped() {
    let router = make_router();
    let (status, json) = get_json(&router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "stopped");
    assert_eq!(json["currentTime"], 0);
    assert_eq!(json["queueLength"], 0);
}

#[tokio::test]
async fn upload_then_list_and_read_world() {
    let router = make_router();
    let (status, json) = post_json(&router, "/api/scenarios", SCENARIO).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["activeScenario"], "taxi-check");
    assert_eq!(json["queueLength"], 1);

    let (_, scenarios) = get_json(&router, "/api/scenarios").await;
    assert_eq!(scenarios.as_array().map(Vec::len), Some(1));
    assert_eq!(scenarios[0]["eventCount"], 1);

    let (_, world) = get_json(&router, "/api/world").await;
    assert_eq!(world["aircraft"][0]["callsign"], "UAL234");
}

#[tokio::test]
async fn malformed_upload_is_bad_request() {
    let router = make_router();
    let (status, json) = post_json(&router, "/api/scenarios", "{\"id\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn unknown_scenario_is_not_found() {
    let router = make_router();
    let (status, json) = post_json(&router, "/api/scenarios/nope/load", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn lifecycle_controls_report_state() {
    let router = make_router();
    let (_, started) = post_json(&router, "/api/control/start", "").await;
    assert_eq!(started["state"], "running");
    let (_, paused) = post_json(&router, "/api/control/pause", "").await;
    assert_eq!(paused["state"], "paused");
    let (_, resumed) = post_json(&router, "/api/control/resume", "").await;
    assert_eq!(resumed["state"], "running");
    let (_, stopped) = post_json(&router, "/api/control/stop", "").await;
    assert_eq!(stopped["state"], "stopped");
}

#[tokio::test]
async fn time_scale_is_clamped() {
    let router = make_router();
    let (status, json) =
        post_json(&router, "/api/control/time-scale", r#"{"timeScale": 100}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["timeScale"], 10.0);
    let (_, json) = post_json(&router, "/api/control/time-scale", r#"{"timeScale": 0}"#).await;
    assert_eq!(json["timeScale"], 0.1);
}

#[tokio::test]
async fn injected_event_is_queued() {
    let router = make_router();
    let event = r#"{"id": "inj-1", "timestamp": 500, "type": "alert-trigger",
                    "parameters": {"message": "manual", "severity": "high"}}"#;
    let (status, json) = post_json(&router, "/api/events", event).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["eventId"], "inj-1");
    assert_eq!(json["queueLength"], 1);
}

#[tokio::test]
async fn compliance_starts_compliant() {
    let router = make_router();
    let (status, json) = get_json(&router, "/api/compliance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"]["overallStatus"], "compliant");
    assert_eq!(json["testCases"].as_array().map(Vec::len), Some(0));
    assert!(json["evaluatedAt"].as_i64().unwrap() > 0);
    assert!(json["status"].get("evaluatedAt").is_none());
}

#[tokio::test]
async fn csv_export_has_header() {
    let router = make_router();
    let response = router
        .clone()
        .oneshot(Request::get("/api/logs/export/csv").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("timestamp,type,eventId,dalLevel,data"));
}

#[tokio::test]
async fn audit_export_is_json() {
    let router = make_router();
    let (status, json) = get_json(&router, "/api/logs/export/audit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recordCount"], 0);
}
