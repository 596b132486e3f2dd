// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.
//!
//! Every failure crosses the HTTP boundary as the same JSON envelope:
//! `{statusCode, message, success: false}`. Nothing is retried and no
//! internal detail leaks into a response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope: `{statusCode, message, success: false}`.
#[derive(Serialize)]
struct ErrorEnvelope {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: String,
    success: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx details stay in the logs, not in the response body
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            message,
            success: false,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
