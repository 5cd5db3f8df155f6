//! Application error type and its HTTP mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::db::DbLockError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown user or wrong password. Deliberately does not say which.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("stored password is not in salt:hash form")]
    InvalidCredentialFormat,

    #[error("username already registered")]
    DuplicateUser,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("storage error during {op}: {source}")]
    StorageUnavailable {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{0}")]
    DbLock(#[from] DbLockError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateUser | AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentialFormat
            | AppError::StorageUnavailable { .. }
            | AppError::DbLock(_)
            | AppError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ApiErrorBody {
        let (code, message) = match self {
            AppError::InvalidCredentials => {
                ("INVALID_CREDENTIALS", "Invalid username or password".to_string())
            }
            // Never say which field collided
            AppError::DuplicateUser => ("REGISTRATION_FAILED", "Registration failed".to_string()),
            AppError::MalformedInput(reason) => ("MALFORMED_INPUT", reason.clone()),
            AppError::NotFound(what) => ("NOT_FOUND", format!("{} not found", what)),
            AppError::Forbidden => ("FORBIDDEN", "Not allowed".to_string()),
            AppError::Conflict(reason) => ("CONFLICT", reason.to_string()),
            AppError::InvalidCredentialFormat
            | AppError::StorageUnavailable { .. }
            | AppError::DbLock(_)
            | AppError::Hashing(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
            ),
        };
        ApiErrorBody { code, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }
        (status, Json(ApiErrorResponse { error: self.body() })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedInput(rejection.body_text())
    }
}

/// Attach the storage operation name to a database error.
///
/// Only the operation is recorded, never the bound parameters, so
/// credentials cannot leak into logs.
pub trait StorageContext<T> {
    fn storage(self, op: &'static str) -> Result<T, AppError>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, op: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::StorageUnavailable { op, source })
    }
}
