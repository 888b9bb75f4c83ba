//! Error types and handling
//!
//! Two layers:
//! - [`IpamError`], the taxonomy returned by the registry, workflow and network services
//! - [`AppError`], the HTTP boundary type rendered as a consistent JSON body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors raised by the IP lifecycle and complaint services
///
/// Every variant except `Storage` describes a failed precondition and is
/// detected before any write is made.
#[derive(Debug, Error)]
pub enum IpamError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    DuplicateAddress(String),

    #[error("{0}")]
    DuplicateHardwareAddress(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyAllocated(String),

    #[error("{0}")]
    AlreadyClosed(String),

    #[error("{0}")]
    ScanFailed(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IpamError {
    /// Machine readable taxonomy name
    pub fn code(&self) -> &'static str {
        match self {
            IpamError::InvalidFormat(_) => "invalid_format",
            IpamError::DuplicateAddress(_) => "duplicate_address",
            IpamError::DuplicateHardwareAddress(_) => "duplicate_hardware_address",
            IpamError::Forbidden(_) => "forbidden",
            IpamError::NotFound(_) => "not_found",
            IpamError::AlreadyAllocated(_) => "already_allocated",
            IpamError::AlreadyClosed(_) => "already_closed",
            IpamError::ScanFailed(_) => "scan_failed",
            IpamError::Storage(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            IpamError::InvalidFormat(_) | IpamError::AlreadyClosed(_) => StatusCode::BAD_REQUEST,
            IpamError::DuplicateAddress(_)
            | IpamError::DuplicateHardwareAddress(_)
            | IpamError::AlreadyAllocated(_) => StatusCode::CONFLICT,
            IpamError::Forbidden(_) => StatusCode::FORBIDDEN,
            IpamError::NotFound(_) => StatusCode::NOT_FOUND,
            IpamError::ScanFailed(_) => StatusCode::BAD_GATEWAY,
            IpamError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for the core services
pub type IpamResult<T> = Result<T, IpamError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - authentication required (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict - resource already exists or state conflict (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable entity - validation failed (422)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Upload exceeds the configured size (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),

    /// Domain rejection from the core services
    #[error(transparent)]
    Ipam(#[from] IpamError),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Add an error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, should_log) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", false),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict", false),
            AppError::ValidationError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", false)
            }
            AppError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", false)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", true),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", true),
            AppError::Ipam(inner) => {
                let status = inner.status();
                (status, inner.code(), status.is_server_error() || status == StatusCode::FORBIDDEN)
            }
        };

        if should_log {
            error!(error = %self, error_type = error_type, "Request error");
        }

        // Server-side causes never reach the client
        let message = match &self {
            AppError::Ipam(IpamError::ScanFailed(msg)) => msg.clone(),
            _ if status.is_server_error() => "Server error".to_string(),
            other => other.to_string(),
        };

        let mut body = ErrorResponse::new(error_type, message);
        if let AppError::Ipam(ref inner) = self {
            body = body.with_code(inner.code());
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.message().contains("UNIQUE constraint failed") {
                    AppError::Conflict("Resource already exists".to_string())
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

/// Name of the column behind a SQLite unique-constraint failure, if any
///
/// SQLite reports `UNIQUE constraint failed: table.column`.
pub fn unique_violation_column(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .message()
            .strip_prefix("UNIQUE constraint failed: ")
            .map(|cols| cols.split(',').next().unwrap_or(cols).trim().to_string()),
        _ => None,
    }
}
