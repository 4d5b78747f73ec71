use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Request-level errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// All sources failed or were quota-denied and the durable store had
    /// nothing matching to fall back on.
    #[error("No job listings available for this query")]
    NoJobsAvailable,

    #[error("Internal error: {0}")]
    #[allow(dead_code)]
    Internal(String),
}

/// Per-adapter fetch failures. Recovered locally by the orchestrator:
/// the failing source is excluded from the merge, siblings are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned HTTP {0}")]
    Status(u16),

    #[error("response parse failed: {0}")]
    Parse(String),

    #[error("fetch timed out after {0}s")]
    Timeout(u64),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NoJobsAvailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No job listings available, try again later".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
