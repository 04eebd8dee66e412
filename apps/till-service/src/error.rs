//! # API Error Type
//!
//! Unified error type for service commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Till POS                               │
//! │                                                                         │
//! │  {"command": "record_sale", ...}                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler: Result<T, ApiError>                            │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  DbError / CoreError ── kind() ──► ErrorKind ──► ApiError        │  │
//! │  │                                                                  │  │
//! │  │  client kinds (400/404/409): message kept                        │  │
//! │  │  storage/internal (500/503/504): logged, generic message         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  {"ok": false, "error": {"code": "NOT_FOUND", "status": 404, ...}}     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use till_core::{CoreError, ErrorKind, ValidationError};
use till_db::DbError;

/// Error returned from service commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "status": 404,
///   "message": "Product not found: 999",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// HTTP-equivalent status
    pub status: u16,

    /// Human-readable error message for display
    pub message: String,

    /// Whether the caller may safely send the same request again
    pub retryable: bool,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    InvalidInput,

    /// Unknown command name (400)
    UnknownCommand,

    /// Resource not found (404)
    NotFound,

    /// Product name taken (409)
    DuplicateName,

    /// Product still referenced by sales (409)
    ReferencedByHistory,

    /// Storage did not answer in time (504)
    StorageTimeout,

    /// Storage not reachable (503)
    StorageUnavailable,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    pub const fn status(self) -> u16 {
        match self {
            ErrorCode::InvalidInput | ErrorCode::UnknownCommand => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::DuplicateName | ErrorCode::ReferencedByHistory => 409,
            ErrorCode::Internal => 500,
            ErrorCode::StorageUnavailable => 503,
            ErrorCode::StorageTimeout => 504,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::DuplicateName => ErrorCode::DuplicateName,
            ErrorKind::ReferencedByHistory => ErrorCode::ReferencedByHistory,
            ErrorKind::StorageTimeout => ErrorCode::StorageTimeout,
            ErrorKind::StorageUnavailable => ErrorCode::StorageUnavailable,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

impl ApiError {
    /// Creates a new, non-retryable API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            status: code.status(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a validation error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidInput, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn unknown_command(command: &str) -> Self {
        ApiError::new(
            ErrorCode::UnknownCommand,
            format!("Unknown command: {}", command),
        )
    }

    /// Marks a storage timeout as retryable. Only read-only commands call
    /// this; writes are never retried automatically.
    pub fn retryable_if_read_only(mut self, read_only: bool) -> Self {
        self.retryable = read_only && self.code == ErrorCode::StorageTimeout;
        self
    }

    fn from_kind(kind: ErrorKind, message: String) -> Self {
        let code = ErrorCode::from(kind);
        match code {
            ErrorCode::StorageTimeout => ApiError::new(code, "Storage did not respond in time"),
            ErrorCode::StorageUnavailable => ApiError::new(code, "Storage is unavailable"),
            ErrorCode::Internal => ApiError::new(code, "Internal error"),
            _ => ApiError::new(code, message),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let kind = err.kind();
        if !kind.is_client_error() {
            // Log the actual error but return a generic message
            tracing::error!(error = %err, kind = ?kind, "Storage operation failed");
        }
        ApiError::from_kind(kind, err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::from_kind(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

/// Malformed command arguments.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid arguments: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for service commands.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_errors_keep_message() {
        let err = ApiError::from(DbError::from(CoreError::ProductNotFound(999)));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "Product not found: 999");
        assert!(!err.retryable);

        let err = ApiError::from(CoreError::ReferencedByHistory {
            product_id: 1,
            sale_count: 3,
        });
        assert_eq!(err.status, 409);
        assert!(err.message.contains("3 sale(s)"));
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err = ApiError::from(DbError::QueryFailed("no such table: sales".to_string()));
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.status, 500);
        assert!(!err.message.contains("sales"));

        let err = ApiError::from(DbError::Timeout {
            operation: "record_sale",
            after: Duration::from_secs(5),
        });
        assert_eq!(err.status, 504);
        assert!(!err.message.contains("record_sale"));
    }

    #[test]
    fn test_retryable_only_for_read_only_timeouts() {
        let timeout = ApiError::new(ErrorCode::StorageTimeout, "slow");
        assert!(timeout.clone().retryable_if_read_only(true).retryable);
        assert!(!timeout.retryable_if_read_only(false).retryable);

        let missing = ApiError::new(ErrorCode::NotFound, "gone");
        assert!(!missing.retryable_if_read_only(true).retryable);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::DuplicateName, "taken")).unwrap();
        assert_eq!(json["code"], "DUPLICATE_NAME");
        assert_eq!(json["status"], 409);
        assert_eq!(json["retryable"], false);
    }
}
