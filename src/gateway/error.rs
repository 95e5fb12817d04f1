//! HTTP-facing error type for the gateway.
//!
//! Internal [`ToolhopError`](crate::ToolhopError) values are mapped onto
//! status codes here so handlers can use `?` and still produce a JSON
//! `{"error": ...}` body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::ToolhopError;

/// Errors a gateway handler can return to the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Tool service unavailable: {0}")]
    ToolServiceUnavailable(String),

    #[error("Turn timed out after {0} ms")]
    TurnTimeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::ToolServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::TurnTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ToolhopError> for ApiError {
    fn from(err: ToolhopError) -> Self {
        match err {
            ToolhopError::ModelUnavailable(msg) => ApiError::ModelUnavailable(msg),
            ToolhopError::TransportUnavailable(msg) => ApiError::ToolServiceUnavailable(msg),
            ToolhopError::Timeout(ms) => ApiError::TurnTimeout(ms),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
