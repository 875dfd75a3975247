//! Error types for the ShelfMaster server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NoSuchEntity = 3,
    BadValue = 4,
    Duplicate = 5,
    PolicyViolation = 6,
    UpstreamFailure = 7,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad input shape or range (e.g. a due date in the past)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity already in a terminal or incompatible state (e.g. double return)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business rule violation (borrowing limit, renewal after due date, ...)
    #[error("Policy violation: {0}")]
    Policy(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// External collaborator (market-price API, SMTP) failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::Policy(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::PolicyViolation, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchEntity, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, ErrorCode::UpstreamFailure, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
