//! Read-only REST endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Scheduler status snapshot |
//! | `GET` | `/api/world` | Live world state |
//! | `GET` | `/api/compliance` | Compliance status and test-case results |
//! | `GET` | `/api/scenarios` | Registered scenarios |
//! | `GET` | `/api/logs` | Most recent audit entries |
//! | `GET` | `/api/logs/export/csv` | CSV export |
//! | `GET` | `/api/logs/export/json` | Full JSON export |
//! | `GET` | `/api/logs/export/audit` | Checksummed audit export |

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use groundops_core::ExportFormat;
use groundops_types::{ComplianceStatus, TestCaseResult};
use serde::Serialize;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of entries returned by `GET /api/logs`.
const DEFAULT_LOG_LIMIT: usize = 100;

/// Upper bound on `limit` for `GET /api/logs`.
const MAX_LOG_LIMIT: usize = 1_000;

/// Query parameters for the `GET /api/logs` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct LogsQuery {
    /// Maximum number of entries to return (default 100, max 1000).
    pub limit: Option<usize>,
}

/// Body of `GET /api/compliance`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResponse {
    /// Windowed compliance status.
    pub status: ComplianceStatus,
    /// Results for the active scenario's test cases.
    pub test_cases: Vec<TestCaseResult>,
    /// Wall-clock time (Unix ms) the response was assembled.
    pub evaluated_at: i64,
}

/// Current scheduler status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.status().await?))
}

/// Copy of the live world state.
pub async fn get_world(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.world().await?))
}

/// Aggregated compliance plus the active scenario's test-case results.
pub async fn get_compliance(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let status = state.handle.compliance_status().await?;
    let test_cases = state.handle.test_case_results().await?;
    Ok(Json(ComplianceResponse {
        status,
        test_cases,
        evaluated_at: Utc::now().timestamp_millis(),
    }))
}

/// Registered scenarios.
pub async fn list_scenarios(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.handle.scenarios().await?))
}

/// Most recent audit entries, newest first.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    Ok(Json(state.handle.recent_logs(limit).await?))
}

async fn export(state: &AppState, format: ExportFormat) -> Result<String, ObserverError> {
    Ok(state.handle.export_logs(format).await??)
}

/// CSV export of the whole audit log.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let body = export(&state, ExportFormat::Csv).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

/// Full JSON export with summary.
pub async fn export_json(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let body = export(&state, ExportFormat::Json).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Restricted audit export with per-record checksums.
pub async fn export_audit(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let body = export(&state, ExportFormat::Audit).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
