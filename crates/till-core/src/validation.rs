//! # Validation Module
//!
//! Input validation for Till POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command boundary (till-service)                              │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: Business rule validation                        │
//! │  └── Runs before any storage write                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE index on product name                                      │
//! │  └── Foreign keys + immutability triggers                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Masala Chai").unwrap();
//! validate_quantity(3).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_TAX_RATE_BPS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum product name length.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum description / reversal reason / setting value length.
pub const MAX_TEXT_LEN: usize = 1000;

/// Maximum settings key length.
pub const MAX_SETTING_KEY_LEN: usize = 64;

/// Maximum unit price in minor units (10,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Maximum quantity on one sale line.
pub const MAX_QUANTITY: i64 = 100_000;

fn reject_control_chars(field: &str, text: &str) -> ValidationResult<()> {
    if text.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
/// - No control characters (newlines, tabs, escapes); receipts print the
///   name on a single line
///
/// ## Returns
/// The trimmed name, which is what the catalog stores and compares.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    reject_control_chars("name", name)?;

    Ok(name.to_string())
}

/// Validates optional free text (description, reversal reason).
///
/// Blank text collapses to `None`. Control characters are rejected.
pub fn validate_optional_text(field: &str, text: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    reject_control_chars(field, text)?;

    Ok(Some(text.to_string()))
}

/// Validates a search fragment.
///
/// ## Rules
/// - Can be empty (lists everything)
/// - Maximum 100 characters
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a settings key: 1-64 characters of `[a-z0-9_.]`.
pub fn validate_setting_key(key: &str) -> ValidationResult<()> {
    if key.is_empty() {
        return Err(ValidationError::Required {
            field: "key".to_string(),
        });
    }

    if key.len() > MAX_SETTING_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "key".to_string(),
            max: MAX_SETTING_KEY_LEN,
        });
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "key".to_string(),
            reason: "must contain only lowercase letters, digits, '_' and '.'".to_string(),
        });
    }

    Ok(())
}

/// Validates a settings value (at most 1000 characters, may be empty).
pub fn validate_setting_value(value: &str) -> ValidationResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: "value".to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_QUANTITY`]
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  record_sale(product_id, quantity)                                      │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(quantity) ← THIS FUNCTION                            │
/// │       │                                                                 │
/// │       ├── qty <= 0 or > MAX? → InvalidInput, nothing written            │
/// │       │                                                                 │
/// │       └── OK → open transaction, snapshot product                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - At most [`MAX_PRICE_CENTS`], so line totals and ledger sums stay
///   within `i64`
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(5_000_000_000_000_000_000).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_TAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a store-assigned id.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Coffee ").unwrap(), "Coffee");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
        assert!(validate_product_name(&"é".repeat(200)).is_ok());
    }

    #[test]
    fn test_control_characters_are_rejected() {
        let err = validate_product_name("Tea\nTOTAL 0.00").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFormat {
                field: "name".to_string(),
                reason: "must not contain control characters".to_string(),
            }
        );
        assert!(validate_product_name("Tea\r").is_ok(), "trailing whitespace is trimmed");
        assert!(validate_product_name("Tea\u{1b}[2J").is_err());
        assert!(validate_optional_text("reason", Some("typo\nTOTAL 0.00")).is_err());
        assert!(validate_optional_text("description", Some("tab\there")).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("description", None).unwrap(), None);
        assert_eq!(validate_optional_text("description", Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("description", Some(" hot ")).unwrap(),
            Some("hot".to_string())
        );
        assert!(validate_optional_text("description", Some(&"x".repeat(1001))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert_eq!(
            validate_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_QUANTITY,
            })
        );
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(5_000_000_000_000_000_000).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps("cgst_rate", 0).is_ok());
        assert!(validate_tax_rate_bps("cgst_rate", 900).is_ok());
        assert!(validate_tax_rate_bps("cgst_rate", 10000).is_ok());
        assert_eq!(
            validate_tax_rate_bps("sgst_rate", 10001),
            Err(ValidationError::OutOfRange {
                field: "sgst_rate".to_string(),
                min: 0,
                max: 10000,
            })
        );
    }

    #[test]
    fn test_validate_setting_key() {
        assert!(validate_setting_key("business_name").is_ok());
        assert!(validate_setting_key("receipt.footer").is_ok());
        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("Business Name").is_err());
        assert!(validate_setting_key(&"k".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  cof ").unwrap(), "cof");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", 1).is_ok());
        assert!(validate_id("product_id", 0).is_err());
    }
}
