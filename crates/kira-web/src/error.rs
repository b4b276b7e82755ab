//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`; the [`IntoResponse`] impl turns
//! every error into a `{"error": message}` body. Client mistakes are 400,
//! everything else is 500 carrying the underlying error text.

use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kira_core::{PipelineError, ServiceError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// A collaborator call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The chat-reply pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Service(_) | ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(rejection: MultipartRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        // Oversized bodies and malformed multipart framing are client errors.
        ServerError::BadRequest(e.body_text())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
