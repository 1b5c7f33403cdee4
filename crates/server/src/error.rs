//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every failure is rendered as the same JSON envelope:
//!
//! ```json
//! { "error": { "kind": "ineligible", "message": "..." } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use comic_claim_core::{INELIGIBLE_MESSAGE, Ineligible, OrderValidationError};

use crate::db::RepositoryError;
use crate::services::orders::OrderError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// The order would exceed the account's eligible count.
    #[error("Ineligible: {0}")]
    Ineligible(#[from] Ineligible),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but does not accept the request method.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Ineligible(e) => Self::Ineligible(e),
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderValidationError> for AppError {
    fn from(err: OrderValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Machine-readable kind plus a message safe to show to callers.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    /// Stable identifier of the error class, as sent to clients.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "internal",
            Self::Ineligible(_) => "ineligible",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::BadRequest(_) => "invalid_request",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ineligible(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::Ineligible(_) => INELIGIBLE_MESSAGE.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::MethodNotAllowed(what) => format!("Method not allowed: {what}"),
            Self::BadRequest(reason) => reason.clone(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
