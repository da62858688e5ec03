//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed, missing, or duplicate input
    #[error("{0}")]
    Validation(String),

    /// Resource absent or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure; details are logged, never returned to the caller
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

fn pg_error_code(err: &anyhow::Error) -> Option<String> {
    err.downcast_ref::<sqlx::Error>().and_then(|e| match e {
        sqlx::Error::Database(db) => db.code().map(|code| code.to_string()),
        _ => None,
    })
}

/// True when the error is a Postgres unique-constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    pg_error_code(err).as_deref() == Some("23505")
}

/// True when the error is a Postgres foreign-key violation
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    pg_error_code(err).as_deref() == Some("23503")
}
