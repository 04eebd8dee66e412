//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  SaleReversal   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄──│  product_id     │◄──│  sale_id (1:1)  │       │
//! │  │  name (unique)  │   │  product_name ❄ │   │  reason         │       │
//! │  │  price_cents    │   │  unit_price ❄   │   │  reversed_at    │       │
//! │  │  cgst/sgst bps  │   │  cgst/sgst ❄    │   └─────────────────┘       │
//! │  │  is_active      │   │  line_total ❄   │                              │
//! │  └─────────────────┘   └─────────────────┘   ┌─────────────────┐       │
//! │     mutable             write-once            │    Setting      │       │
//! │                                               │  key → value    │       │
//! │  ❄ = snapshot frozen at time of sale          └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity carries an `i64` id assigned by the store on insert.
//! Ids are never reused and never change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::validation::{
    validate_optional_text, validate_price_cents, validate_product_name, validate_tax_rate_bps,
};

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display name shown to cashier and on receipt. Unique, ignoring case.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Price in minor units.
    pub price_cents: i64,

    /// Central GST rate in basis points (250 = 2.5%).
    pub cgst_rate_bps: u32,

    /// State GST rate in basis points.
    pub sgst_rate_bps: u32,

    /// False once retired from the catalog.
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the CGST rate.
    #[inline]
    pub fn cgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.cgst_rate_bps)
    }

    /// Returns the SGST rate.
    #[inline]
    pub fn sgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sgst_rate_bps)
    }

    /// Combined tax rate applied to a line (CGST + SGST).
    #[inline]
    pub fn combined_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.cgst_rate_bps.saturating_add(self.sgst_rate_bps))
    }
}

// =============================================================================
// Product Draft
// =============================================================================

/// The writable fields of a product, used for both create and update.
///
/// ## Lifecycle
/// ```text
/// caller input ──► ProductDraft ──► validate() ──► normalized ProductDraft
///                                                       │
///                                     create / update ◄─┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub cgst_rate_bps: u32,
    pub sgst_rate_bps: u32,
}

impl ProductDraft {
    /// Creates a draft without a description.
    pub fn new(
        name: impl Into<String>,
        price: Money,
        cgst_rate: TaxRate,
        sgst_rate: TaxRate,
    ) -> Self {
        ProductDraft {
            name: name.into(),
            description: None,
            price_cents: price.cents(),
            cgst_rate_bps: cgst_rate.bps(),
            sgst_rate_bps: sgst_rate.bps(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks every field and returns the normalized draft.
    ///
    /// Names are trimmed and blank descriptions become `None`; the result
    /// is exactly what the catalog stores.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Money, ProductDraft, TaxRate};
    ///
    /// let draft = ProductDraft::new(" Coffee ", Money::from_cents(10_000),
    ///     TaxRate::from_bps(500), TaxRate::from_bps(500));
    /// assert_eq!(draft.validate().unwrap().name, "Coffee");
    /// ```
    pub fn validate(&self) -> CoreResult<ProductDraft> {
        let name = validate_product_name(&self.name)?;
        let description = validate_optional_text("description", self.description.as_deref())?;
        validate_price_cents(self.price_cents)?;
        validate_tax_rate_bps("cgst_rate", self.cgst_rate_bps)?;
        validate_tax_rate_bps("sgst_rate", self.sgst_rate_bps)?;

        Ok(ProductDraft {
            name,
            description,
            price_cents: self.price_cents,
            cgst_rate_bps: self.cgst_rate_bps,
            sgst_rate_bps: self.sgst_rate_bps,
        })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale of one product line.
///
/// Uses the snapshot pattern: every price, rate and amount is frozen at the
/// moment of sale and never recomputed. Later catalog edits cannot reach it.
///
/// For every row:
/// - `subtotal = unit_price × quantity`
/// - `cgst = round_half_up(subtotal × cgst_rate)`, same for `sgst`
/// - `line_total = subtotal + cgst + sgst`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in minor units at time of sale (frozen).
    pub unit_price_cents: i64,
    pub cgst_rate_bps: u32,
    pub sgst_rate_bps: u32,
    /// unit price × quantity.
    pub subtotal_cents: i64,
    pub cgst_cents: i64,
    pub sgst_cents: i64,
    /// subtotal + CGST + SGST.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn cgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.cgst_rate_bps)
    }

    #[inline]
    pub fn sgst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sgst_rate_bps)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn cgst(&self) -> Money {
        Money::from_cents(self.cgst_cents)
    }

    #[inline]
    pub fn sgst(&self) -> Money {
        Money::from_cents(self.sgst_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Human-readable receipt number (`S-000042`).
    pub fn receipt_number(&self) -> String {
        format!("S-{:06}", self.id)
    }

    /// Re-checks the snapshot arithmetic against the tax engine.
    ///
    /// Rows written by the ledger always pass; a failure means the store
    /// was edited behind the ledger's back.
    pub fn verify_amounts(&self) -> CoreResult<()> {
        let expected = crate::tax::compute_line(
            self.unit_price(),
            self.quantity,
            self.cgst_rate(),
            self.sgst_rate(),
        )?;

        let consistent = expected.subtotal == self.subtotal()
            && expected.cgst == self.cgst()
            && expected.sgst == self.sgst()
            && expected.line_total == self.line_total();

        if consistent {
            Ok(())
        } else {
            Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "sale".to_string(),
                    reason: format!("stored amounts of sale {} do not add up", self.id),
                },
            ))
        }
    }
}

// =============================================================================
// Sale Reversal
// =============================================================================

/// Append-only record cancelling a sale.
///
/// The original sale row is never touched; reports net reversed sales out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReversal {
    pub id: i64,
    pub sale_id: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub reversed_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

/// Filter for listing and summarising sales.
///
/// `from` is inclusive and `to` exclusive, so consecutive windows never
/// count a sale twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct SaleFilter {
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub exclude_reversed: bool,
}

impl SaleFilter {
    /// Restricts the filter to one product.
    pub fn for_product(product_id: i64) -> Self {
        SaleFilter {
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    /// Restricts the filter to `[from, to)`.
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

/// Aggregate totals over a set of sales, net of reversals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesSummary {
    /// All matching sales, reversed or not.
    pub sale_count: i64,
    /// How many of them carry a reversal.
    pub reversed_count: i64,
    pub subtotal_cents: i64,
    pub cgst_cents: i64,
    pub sgst_cents: i64,
    pub total_cents: i64,
}

impl SalesSummary {
    /// Sales still counted in the totals.
    #[inline]
    pub fn net_count(&self) -> i64 {
        self.sale_count - self.reversed_count
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// A single business setting (`business_name`, `currency_code`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    fn sale() -> Sale {
        Sale {
            id: 42,
            product_id: 1,
            product_name: "Coffee".to_string(),
            quantity: 3,
            unit_price_cents: 10_000,
            cgst_rate_bps: 500,
            sgst_rate_bps: 500,
            subtotal_cents: 30_000,
            cgst_cents: 1_500,
            sgst_cents: 1_500,
            line_total_cents: 33_000,
            sold_at: Utc::now(),
        }
    }

    #[test]
    fn test_draft_validate_normalizes() {
        let draft = ProductDraft::new(
            "  Masala Chai ",
            Money::from_cents(2_500),
            TaxRate::from_bps(250),
            TaxRate::from_bps(250),
        )
        .with_description("   ");

        let valid = draft.validate().unwrap();
        assert_eq!(valid.name, "Masala Chai");
        assert_eq!(valid.description, None);
    }

    #[test]
    fn test_draft_validate_rejects() {
        let base = ProductDraft::new("Tea", Money::zero(), TaxRate::zero(), TaxRate::zero());

        let mut bad = base.clone();
        bad.price_cents = -1;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.sgst_rate_bps = 10_001;
        assert!(matches!(
            bad.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let mut bad = base;
        bad.name = " ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_sale_accessors() {
        let sale = sale();
        assert_eq!(sale.receipt_number(), "S-000042");
        assert_eq!(sale.line_total().to_string(), "330.00");
        assert_eq!(sale.cgst_rate().to_string(), "5%");
        assert!(sale.verify_amounts().is_ok());
    }

    #[test]
    fn test_verify_amounts_detects_tampering() {
        let mut sale = sale();
        sale.line_total_cents += 1;
        assert!(sale.verify_amounts().is_err());
    }

    #[test]
    fn test_filter_deserializes_partial() {
        let filter: SaleFilter = serde_json::from_str(r#"{"product_id": 7}"#).unwrap();
        assert_eq!(filter, SaleFilter::for_product(7));
        assert!(!filter.exclude_reversed);
    }

    #[test]
    fn test_summary_net_count() {
        let summary = SalesSummary {
            sale_count: 5,
            reversed_count: 2,
            ..Default::default()
        };
        assert_eq!(summary.net_count(), 3);
    }
}
