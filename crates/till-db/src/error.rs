//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Domain rule (CoreError)             │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ◄──────── DbError::Domain                       │
//! │       │                                                                 │
//! │       │  .kind() → ErrorKind                                           │
//! │       ▼                                                                 │
//! │  ApiError (till-service) ← code + status for the caller                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use thiserror::Error;
use till_core::{CoreError, ErrorKind};

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and classification.
#[derive(Debug, Error)]
pub enum DbError {
    /// Domain rule violated inside a storage operation.
    ///
    /// ## When This Occurs
    /// - Selling a missing or retired product
    /// - Deleting a product that sales reference
    /// - Reversing a sale twice
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate product name
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a product that sales still reference
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created or opened
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// SQLite reported the database as busy or locked.
    #[error("Database busy: {0}")]
    Busy(String),

    /// Operation did not finish within the storage timeout.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Pool has been closed.
    #[error("Connection pool is closed")]
    PoolClosed,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Classifies the error onto the shared taxonomy.
    ///
    /// ## Mapping
    /// ```text
    /// Domain(e)                        → e.kind()
    /// NotFound                         → NotFound
    /// UniqueViolation                  → DuplicateName
    /// ForeignKeyViolation              → ReferencedByHistory
    /// Timeout / Busy / PoolExhausted   → StorageTimeout
    /// ConnectionFailed / PoolClosed    → StorageUnavailable
    /// everything else                  → Internal
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Domain(e) => e.kind(),
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::DuplicateName,
            DbError::ForeignKeyViolation { .. } => ErrorKind::ReferencedByHistory,
            DbError::Timeout { .. } | DbError::Busy(_) | DbError::PoolExhausted => {
                ErrorKind::StorageTimeout
            }
            DbError::ConnectionFailed(_) | DbError::PoolClosed => ErrorKind::StorageUnavailable,
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Borrows the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<till_core::ValidationError> for DbError {
    fn from(err: till_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint kind, busy, or QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::PoolClosed
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if db_err.is_unique_violation() {
                    // "UNIQUE constraint failed: products.name"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { message: msg }
                } else if matches!(db_err.code().as_deref(), Some("5" | "6" | "261" | "517")) {
                    // SQLITE_BUSY, SQLITE_LOCKED and their extended codes
                    DbError::Busy(msg)
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::PoolClosed,

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            DbError::Domain(CoreError::ProductNotFound(9)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(DbError::duplicate("name", "Tea").kind(), ErrorKind::DuplicateName);
        assert_eq!(
            DbError::Timeout {
                operation: "record_sale",
                after: Duration::from_millis(5),
            }
            .kind(),
            ErrorKind::StorageTimeout
        );
        assert_eq!(DbError::PoolClosed.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(DbError::QueryFailed("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_timeout_message() {
        let err = DbError::Timeout {
            operation: "list_sales",
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "list_sales timed out after 250ms");
    }

    #[test]
    fn test_domain_message_is_transparent() {
        let err: DbError = CoreError::AlreadyReversed(4).into();
        assert_eq!(err.to_string(), "Sale 4 has already been reversed");
        assert!(err.as_domain().is_some());
    }
}
