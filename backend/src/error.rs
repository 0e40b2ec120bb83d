//! Error handling for the Academia backend
//!
//! Every failure is rendered as `{"status": "failed", "type": <kind>, ...}`.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{field_errors, STATUS_FAILED};
use thiserror::Error;
use validator::ValidationErrors;

/// Application error types
#[derive(Error, Debug)]
pub enum ApiError {
    // Authentication errors
    #[error("Authentication failed")]
    AuthFailure,

    #[error("Login required")]
    LoginRequired,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Validation errors
    #[error("Invalid arguments: {0:?}")]
    ArgFormat(BTreeMap<String, Vec<String>>),

    // Business logic errors
    #[error("Logic error: {reason}")]
    Logic { status: StatusCode, reason: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A request that is well formed but cannot be honoured
    pub fn logic(reason: impl Into<String>) -> Self {
        ApiError::Logic {
            status: StatusCode::BAD_REQUEST,
            reason: reason.into(),
        }
    }

    /// A request that clashes with existing data
    pub fn conflict(reason: impl Into<String>) -> Self {
        ApiError::Logic {
            status: StatusCode::CONFLICT,
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ApiError::NotFound(resource.into())
    }

    /// Single-field argument error
    pub fn arg(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::ArgFormat(errors)
    }

    /// Wire value of the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthFailure => "auth_failure",
            ApiError::LoginRequired => "login_required",
            ApiError::PermissionDenied => "perm_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::ArgFormat(_) => "arg_fmt",
            ApiError::Logic { .. } => "logic",
            ApiError::Storage(_)
            | ApiError::DatabaseError(_)
            | ApiError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthFailure | ApiError::LoginRequired => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ArgFormat(_) => StatusCode::BAD_REQUEST,
            ApiError::Logic { status, .. } => *status,
            ApiError::Storage(_)
            | ApiError::DatabaseError(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    fn bare(kind: &'static str) -> Self {
        Self {
            status: STATUS_FAILED,
            kind,
            resource: None,
            reason: None,
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorResponse::bare(self.kind());

        match &self {
            ApiError::NotFound(resource) => body.resource = Some(resource.clone()),
            ApiError::ArgFormat(errors) => body.errors = Some(errors.clone()),
            ApiError::Logic { reason, .. } => body.reason = Some(reason.clone()),
            _ => {}
        }

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ArgFormat(field_errors(&errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::arg("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::arg("query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::not_found("resource")
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::arg("body", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::arg("body", error.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", error))
    }
}

/// Map a unique-constraint violation to a 409 `logic` error, passing other
/// database errors through
pub fn on_unique_violation(reason: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |error| match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::conflict(reason),
        _ => ApiError::DatabaseError(error),
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, ApiError>;
