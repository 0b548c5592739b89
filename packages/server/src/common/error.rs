use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::auth::AuthRejection;

/// Record store failures.
///
/// `NotFound` is the only signature handlers look at; everything else is
/// reported to the caller as a generic failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Errors returned from HTTP handlers. Every variant renders as
/// `{"error": ...}` with the matching status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Not implemented")]
    NotImplemented,

    /// Carries the public message only; details are logged where they occur.
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Auth(#[from] AuthRejection),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Map a store failure: not-found becomes 404 with `not_found`, anything
    /// else is logged and becomes 500 with `failure`.
    pub fn from_store(err: StoreError, not_found: &str, failure: &str) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(not_found.to_string()),
            other => {
                error!(error = %other, "{}", failure);
                ApiError::Internal(failure.to_string())
            }
        }
    }

    /// Map a store failure where "not found" is not a meaningful outcome.
    pub fn internal(err: StoreError, failure: &str) -> Self {
        error!(error = %err, "{}", failure);
        ApiError::Internal(failure.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(rejection) => rejection.status(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(rejection) => rejection.into_response(),
            other => (other.status(), Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
