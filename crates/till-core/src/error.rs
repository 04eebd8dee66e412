//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable taxonomy every error maps onto          │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures (+ wrapped CoreError)         │
//! │                                                                         │
//! │  till-service errors (app)                                             │
//! │  └── ApiError         - What callers see (code + status)               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable classification shared by every error in the workspace.
///
/// The command boundary derives its error codes and statuses from this
/// enum alone, so adding a variant here is a wire-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad quantity, price, rate, name, or an operation the current state forbids.
    InvalidInput,
    /// Product or sale absent.
    NotFound,
    /// Catalog name uniqueness violation.
    DuplicateName,
    /// Hard delete blocked by sale history.
    ReferencedByHistory,
    /// Storage did not answer within the configured bound.
    StorageTimeout,
    /// Storage cannot be reached at all.
    StorageUnavailable,
    /// Anything unexpected.
    Internal,
}

impl ErrorKind {
    /// True for errors caused by the request rather than the system.
    pub const fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidInput
                | ErrorKind::NotFound
                | ErrorKind::DuplicateName
                | ErrorKind::ReferencedByHistory
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Ids are the integer
/// identities assigned by the store.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Product exists but has been retired from the catalog.
    ///
    /// ## When This Occurs
    /// - Recording a sale against a retired product
    #[error("Product {0} is retired and cannot be sold")]
    ProductRetired(i64),

    /// Another product already uses this display name.
    #[error("A product named '{0}' already exists")]
    DuplicateName(String),

    /// Hard delete refused because sales still reference the product.
    ///
    /// ## User Workflow
    /// ```text
    /// DELETE product 7
    ///      │
    ///      ▼
    /// 12 sales reference product 7
    ///      │
    ///      ▼
    /// ReferencedByHistory { product_id: 7, sale_count: 12 }
    ///      │
    ///      ▼
    /// Caller offers "retire" instead
    /// ```
    #[error("Product {product_id} is referenced by {sale_count} sale(s); retire it instead")]
    ReferencedByHistory { product_id: i64, sale_count: i64 },

    /// Sale already carries a reversal record.
    #[error("Sale {0} has already been reversed")]
    AlreadyReversed(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps the error onto the shared taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => ErrorKind::NotFound,
            CoreError::DuplicateName(_) => ErrorKind::DuplicateName,
            CoreError::ReferencedByHistory { .. } => ErrorKind::ReferencedByHistory,
            CoreError::ProductRetired(_)
            | CoreError::AlreadyReversed(_)
            | CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any storage write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., "12.345" for an amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Arithmetic on the value would not fit in the money representation.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ReferencedByHistory {
            product_id: 7,
            sale_count: 12,
        };
        assert_eq!(
            err.to_string(),
            "Product 7 is referenced by 12 sale(s); retire it instead"
        );
        assert_eq!(CoreError::ProductNotFound(999).to_string(), "Product not found: 999");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::SaleNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::DuplicateName("Coffee".into()).kind(),
            ErrorKind::DuplicateName
        );
        assert_eq!(CoreError::AlreadyReversed(3).kind(), ErrorKind::InvalidInput);
        assert!(ErrorKind::ReferencedByHistory.is_client_error());
        assert!(!ErrorKind::StorageTimeout.is_client_error());
    }

    #[test]
    fn test_kind_serializes_as_stable_code() {
        let json = serde_json::to_string(&ErrorKind::ReferencedByHistory).unwrap();
        assert_eq!(json, "\"REFERENCED_BY_HISTORY\"");
    }
}
