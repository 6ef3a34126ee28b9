//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use groundops_audit::AuditError;
use groundops_core::{DriverError, ScenarioError};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The request was malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A scenario could not be found or parsed.
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// The simulation driver is unavailable.
    #[error("driver unavailable: {0}")]
    Driver(#[from] DriverError),

    /// An audit export failed.
    #[error("export failed: {0}")]
    Export(#[from] AuditError),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Scenario(ScenarioError::UnknownScenario { .. }) => StatusCode::NOT_FOUND,
            Self::Scenario(ScenarioError::Parse { .. }) => StatusCode::BAD_REQUEST,
            Self::Scenario(ScenarioError::Io { .. }) | Self::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Driver(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
