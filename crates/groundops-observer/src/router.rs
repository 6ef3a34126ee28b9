//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, handlers, ws};

/// Build the complete Axum router for the Observer server.
///
/// See [`handlers`] and [`control`] for the route tables. CORS allows any
/// origin so a locally served dashboard can reach the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/notifications", get(ws::ws_notifications))
        // Read API
        .route("/api/status", get(handlers::get_status))
        .route("/api/world", get(handlers::get_world))
        .route("/api/compliance", get(handlers::get_compliance))
        .route(
            "/api/scenarios",
            get(handlers::list_scenarios).post(control::upload_scenario),
        )
        .route("/api/logs", get(handlers::list_logs))
        .route("/api/logs/export/csv", get(handlers::export_csv))
        .route("/api/logs/export/json", get(handlers::export_json))
        .route("/api/logs/export/audit", get(handlers::export_audit))
        // Control API
        .route("/api/scenarios/{id}/load", post(control::load_scenario))
        .route("/api/events", post(control::inject_event))
        .route("/api/control/start", post(control::start))
        .route("/api/control/pause", post(control::pause))
        .route("/api/control/resume", post(control::resume))
        .route("/api/control/stop", post(control::stop))
        .route("/api/control/reset", post(control::reset))
        .route("/api/control/time-scale", post(control::set_time_scale))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
