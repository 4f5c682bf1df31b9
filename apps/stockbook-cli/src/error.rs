//! # View Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockbook                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<String, ViewError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Query Error? ─── QueryError::Http { 404, .. } ───┐             │  │
//! │  │         │                                          │             │  │
//! │  │         ▼                                          ▼             │  │
//! │  │  Form Error? ──── QueryError::Validation ──────► ViewError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr:  error [NOT_FOUND]: Product not found                          │
//! │  The underlying cause goes to the log, never to the user.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stockbook_core::{CoreError, FieldErrors};
use stockbook_query::QueryError;

/// Error returned from CLI commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Message safe to show to the user
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The backend rejected the request
    BackendError,

    /// The backend could not be reached
    NetworkError,

    /// Writing a download failed
    DownloadError,

    /// Bad configuration
    ConfigError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BackendError => "BACKEND_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::DownloadError => "DOWNLOAD_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ViewError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ViewError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ViewError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ViewError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal() -> Self {
        ViewError::new(ErrorCode::Internal, "Something went wrong")
    }

    /// Maps a query failure on a specific entity, so a 404 names it.
    pub fn from_lookup(resource: &str, id: &str, err: QueryError) -> Self {
        if err.is_not_found() {
            ViewError::not_found(resource, id)
        } else {
            err.into()
        }
    }
}

/// One line per failing field: `price: price must be positive`.
fn describe_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(key, err)| format!("{}: {}", key, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Converts query errors to view errors.
impl From<QueryError> for ViewError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(fields) => ViewError::validation(describe_fields(&fields)),
            QueryError::Http { status: 404, .. } => {
                ViewError::new(ErrorCode::NotFound, "Not found")
            }
            QueryError::Http { status, message } => {
                tracing::warn!(status, %message, "Backend rejected request");
                ViewError::new(ErrorCode::BackendError, message)
            }
            QueryError::Network(e) => {
                tracing::error!("Network failure: {}", e);
                ViewError::new(ErrorCode::NetworkError, "Could not reach the server")
            }
            QueryError::Timeout => {
                ViewError::new(ErrorCode::NetworkError, "The server took too long to answer")
            }
            err @ (QueryError::InvalidConfig(_)
            | QueryError::InvalidUrl(_)
            | QueryError::ConfigLoadFailed(_)) => {
                tracing::error!("Configuration error: {}", err);
                ViewError::new(ErrorCode::ConfigError, "Invalid configuration")
            }
            other => {
                tracing::error!("Query failed: {}", other);
                ViewError::internal()
            }
        }
    }
}

/// Converts core errors to view errors.
impl From<CoreError> for ViewError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ViewError::validation(e.to_string()),
            CoreError::InvalidForm(fields) => ViewError::validation(describe_fields(&fields)),
            other => {
                tracing::error!("Export failed: {}", other);
                ViewError::internal()
            }
        }
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ViewError {}
