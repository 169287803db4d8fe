//! API error type with JSON bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use vox_agent::InterpretError;
use vox_core::StoreError;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The command was empty or whitespace-only.
    #[error("command must not be empty")]
    EmptyCommand,
    /// The session id does not exist.
    #[error("unknown session: {0}")]
    UnknownSession(String),
    /// Anything else. The detail is logged, not sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownSession(id) => ApiError::UnknownSession(id),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<InterpretError> for ApiError {
    fn from(err: InterpretError) -> Self {
        match err {
            InterpretError::EmptyCommand => ApiError::EmptyCommand,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::EmptyCommand => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::UnknownSession(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(detail) => {
                error!(detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
