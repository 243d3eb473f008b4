// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type.
///
/// View models recover these at the component boundary and turn them into
/// display strings with [`AppError::user_message`]; only errors that escape
/// a handler are converted to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input, caught before any network call.
    #[error("{0}")]
    Validation(String),

    /// Bad credentials, duplicate signup, password mismatch.
    #[error("{0}")]
    Auth(String),

    /// Zero or multiple rows for a single-item fetch.
    #[error("{0}")]
    NotFound(String),

    /// Network or service failure. The message is the backend's own when it
    /// sent one, and may be empty.
    #[error("{0}")]
    Backend(String),

    /// The session check could not reach the backend.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown to the user, falling back to `fallback` when the backend
    /// did not provide one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Backend(msg) | AppError::Unavailable(msg) if msg.trim().is_empty() => {
                fallback.to_string()
            }
            AppError::Backend(msg) => msg.clone(),
            AppError::Internal(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }

    /// Short machine-readable kind, used in JSON bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Auth(_) => "auth",
            AppError::NotFound(_) => "not_found",
            AppError::Backend(_) => "backend",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Backend(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_passes_through() {
        let err = AppError::Backend("relation \"appointments\" does not exist".to_string());
        assert_eq!(
            err.user_message("Failed to fetch appointments"),
            "relation \"appointments\" does not exist"
        );
    }

    #[test]
    fn test_empty_backend_message_uses_fallback() {
        let err = AppError::Backend(String::new());
        assert_eq!(
            err.user_message("Failed to fetch treatments"),
            "Failed to fetch treatments"
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = AppError::Validation("Please enter an appointment ID".to_string());
        assert_eq!(err.user_message("ignored"), "Please enter an appointment ID");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::NotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::Unavailable("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
