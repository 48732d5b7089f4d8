// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use crate::services::AccountError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Account operation failed; the message is shown to the user as-is.
    #[error("{}", .0.user_message())]
    Account(#[from] AccountError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
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
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Account(AccountError::ProfileWrite { uid, source }) => {
                tracing::error!(uid = %uid, error = %source, "Profile write failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "profile_write_failed",
                    Some(self.to_string()),
                )
            }
            AppError::Account(e) => (
                account_status(e),
                "account_error",
                Some(e.user_message()),
            ),
            AppError::Store(StoreError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()))
            }
            AppError::Store(StoreError::InvalidKey(key)) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                Some(format!("Invalid key: {}", key)),
            ),
            AppError::Store(StoreError::PermissionDenied(msg)) => {
                tracing::error!(error = %msg, "Database permission denied");
                (StatusCode::FORBIDDEN, "permission_denied", None)
            }
            AppError::Store(StoreError::Unavailable(msg)) => {
                tracing::error!(error = %msg, "Database unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Store(err) => {
                tracing::error!(error = %err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Provider rejections are the caller's fault; anything else is upstream.
fn account_status(err: &AccountError) -> StatusCode {
    use crate::services::IdentityError;

    match err {
        AccountError::Identity(IdentityError::Rejected(_))
        | AccountError::PasswordReset {
            source: IdentityError::Rejected(_),
            ..
        } => StatusCode::BAD_REQUEST,
        AccountError::Identity(IdentityError::Unavailable(_))
        | AccountError::PasswordReset {
            source: IdentityError::Unavailable(_),
            ..
        } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
