//! HTTP API handlers
//!
//! Responses use the `{"data": ..., "meta": {...}}` envelope; errors
//! come back as `{"error": "..."}` with a status mapped from the
//! common error type.

pub mod farms;
pub mod health;
pub mod jobs;
pub mod observations;
pub mod paddocks;
pub mod recommendations;
pub mod weather;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use farmsight_common::Error;
use serde_json::json;

/// Handler result type: a JSON body or a mapped error response
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Adapter mapping the common error type onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
