//! # Query Error Types
//!
//! Error types for fetches and mutations against the REST backend.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Query Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Programmer          │ │
//! │  │                 │  │   (retried)     │  │     (never retried)     │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Encode                 │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Decode                 │ │
//! │  │  ConfigLoad...  │  │  Http {status}  │  │  Validation             │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockbook_core::{CoreError, FieldErrors};
use thiserror::Error;

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Message used when a failed response carries no `message` of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";

/// Query error type covering every way a request can fail.
///
/// ## Design Principles
/// - `Clone`: one in-flight request hands the same outcome to every waiter
/// - Categorized for the retry policy (see [`QueryError::is_retryable`])
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid query configuration.
    #[error("Invalid query configuration: {0}")]
    InvalidConfig(String),

    /// Invalid backend URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The configured request timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // =========================================================================
    // Programmer Errors
    // =========================================================================
    /// A payload could not be encoded as JSON.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// A response could not be decoded into the expected type.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A form failed client-side validation; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A background fetch task died before reporting.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for QueryError {
    fn from(err: url::ParseError) -> Self {
        QueryError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        QueryError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        QueryError::ConfigLoadFailed(err.to_string())
    }
}

impl From<CoreError> for QueryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidForm(fields) => QueryError::Validation(fields),
            other => QueryError::Encode(other.to_string()),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> QueryError {
    if err.is_timeout() {
        QueryError::Timeout
    } else {
        QueryError::Network(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl QueryError {
    /// Returns true if the identical request may be sent again.
    ///
    /// ## Retryable Errors
    /// - Network failures and timeouts
    /// - Any non-2xx response
    ///
    /// ## Non-Retryable Errors
    /// - Encode / decode / validation failures (the retry would fail the same way)
    /// - Configuration errors
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::Network(_) | QueryError::Timeout | QueryError::Http { .. }
        )
    }

    /// Returns the HTTP status, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 404 from the backend.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidConfig(_) | QueryError::InvalidUrl(_) | QueryError::ConfigLoadFailed(_)
        )
    }
}
