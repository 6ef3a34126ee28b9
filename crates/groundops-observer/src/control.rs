//! Control REST API handlers: lifecycle, time scale, scenario loading, and
//! event injection.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/control/start` | Start the simulation |
//! | `POST` | `/api/control/pause` | Pause |
//! | `POST` | `/api/control/resume` | Resume |
//! | `POST` | `/api/control/stop` | Stop |
//! | `POST` | `/api/control/reset` | Reset and reload the active scenario |
//! | `POST` | `/api/control/time-scale` | Set the (clamped) time scale |
//! | `POST` | `/api/events` | Inject an event |
//! | `POST` | `/api/scenarios` | Upload and load a scenario document |
//! | `POST` | `/api/scenarios/{id}/load` | Load a registered scenario |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use groundops_types::SimulationEvent;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/control/time-scale`.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeScaleRequest {
    /// Requested time scale; clamped to `[0.1, 10.0]`.
    pub time_scale: f64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Start the simulation.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.start().await?))
}

/// Pause the simulation.
pub async fn pause(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.pause().await?))
}

/// Resume the simulation.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.resume().await?))
}

/// Stop the simulation.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.stop().await?))
}

/// Reset the simulation.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.reset().await?))
}

/// Set the time scale. Out-of-range values are clamped, not rejected.
pub async fn set_time_scale(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TimeScaleRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let applied = state.handle.set_time_scale(body.time_scale).await?;
    info!(requested = body.time_scale, applied, "Operator changed time scale");
    Ok(Json(serde_json::json!({
        "requested": body.time_scale,
        "timeScale": applied,
    })))
}

// ---------------------------------------------------------------------------
// Events and scenarios
// ---------------------------------------------------------------------------

/// Inject an event into the queue.
pub async fn inject_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<SimulationEvent>,
) -> Result<impl IntoResponse, ObserverError> {
    let event_id = event.id.clone();
    let queue_length = state.handle.inject_event(event).await?;
    info!(%event_id, queue_length, "Operator injected event");
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "eventId": event_id,
            "queueLength": queue_length,
        })),
    ))
}

/// Load a registered scenario by id.
pub async fn load_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let status = state.handle.load_scenario(id).await??;
    Ok(Json(status))
}

/// Register a scenario from the request body and load it.
///
/// The body is taken as raw text so a malformed document is reported as
/// a scenario parse error rather than an extractor rejection.
pub async fn upload_scenario(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ObserverError> {
    if body.trim().is_empty() {
        return Err(ObserverError::BadRequest("empty scenario document".to_owned()));
    }
    let status = state.handle.load_scenario_json(body).await??;
    Ok((StatusCode::CREATED, Json(status)))
}
