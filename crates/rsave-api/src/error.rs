//! API error types.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

static REDACT_INTERNAL_DETAILS: OnceLock<bool> = OnceLock::new();

/// Set once at startup from `ApiConfig::is_production`. When true,
/// internal error details are replaced with a generic message in
/// responses.
pub fn set_detail_redaction(redact: bool) {
    let _ = REDACT_INTERNAL_DETAILS.set(redact);
}

fn redact_details() -> bool {
    *REDACT_INTERNAL_DETAILS.get().unwrap_or(&false)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] rsave_store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] rsave_queue::QueueError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The detail string exposed to clients.
    fn public_detail(&self, redact_internal: bool) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Store(_) | ApiError::Queue(_) if redact_internal => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Store(_) | ApiError::Queue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.public_detail(redact_details());
        let body = ErrorResponse { detail };

        (status, Json(body)).into_response()
    }
}
