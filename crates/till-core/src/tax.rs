//! # Tax Engine
//!
//! Computes the exact amounts of one sale line from a unit price, a
//! quantity and the two GST components.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       compute_line                                      │
//! │                                                                         │
//! │  unit_price ──┐                                                         │
//! │               ├──► subtotal = unit_price × quantity    (checked i64)    │
//! │  quantity ────┘         │                                               │
//! │                         ├──► cgst = round_half_up(subtotal × cgst_bps)  │
//! │                         ├──► sgst = round_half_up(subtotal × sgst_bps)  │
//! │                         │                                               │
//! │                         └──► line_total = subtotal + cgst + sgst        │
//! │                                                                         │
//! │  Each component is rounded on its own BEFORE summing, so the printed   │
//! │  CGST and SGST lines always add up to the printed total.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is pure: same inputs, same outputs, no clock and no storage.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::validation::{validate_price_cents, validate_quantity, validate_tax_rate_bps};

/// Exact amounts of one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAmounts {
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub line_total: Money,
}

impl LineAmounts {
    /// CGST + SGST.
    #[inline]
    pub fn tax(&self) -> Money {
        self.cgst + self.sgst
    }
}

/// Computes subtotal, both tax components and the line total.
///
/// ## Errors
/// `InvalidInput` (as [`crate::CoreError::Validation`]) when
/// - quantity is zero or negative
/// - the unit price is negative
/// - a rate lies outside 0%..=100%
/// - the subtotal or total does not fit in `i64` minor units
///
/// ## Example
/// ```rust
/// use till_core::{compute_line, Money, TaxRate};
///
/// let line = compute_line(
///     Money::from_cents(1250),
///     1,
///     TaxRate::from_bps(900),
///     TaxRate::from_bps(900),
/// )
/// .unwrap();
///
/// // 12.50 × 9% = 1.125 → 1.13, on each component
/// assert_eq!(line.cgst.cents(), 113);
/// assert_eq!(line.line_total.cents(), 1250 + 113 + 113);
/// ```
pub fn compute_line(
    unit_price: Money,
    quantity: i64,
    cgst_rate: TaxRate,
    sgst_rate: TaxRate,
) -> CoreResult<LineAmounts> {
    validate_quantity(quantity)?;
    validate_price_cents(unit_price.cents())?;
    validate_tax_rate_bps("cgst_rate", cgst_rate.bps())?;
    validate_tax_rate_bps("sgst_rate", sgst_rate.bps())?;

    let overflow = || ValidationError::Overflow {
        field: "subtotal".to_string(),
    };

    let subtotal = unit_price.checked_mul_quantity(quantity).ok_or_else(overflow)?;
    let cgst = subtotal.calculate_tax(cgst_rate);
    let sgst = subtotal.calculate_tax(sgst_rate);

    // Each rate is at most 100%, but subtotal + 2 × subtotal can still overflow.
    let line_total = subtotal
        .checked_add(cgst)
        .and_then(|t| t.checked_add(sgst))
        .ok_or_else(overflow)?;

    Ok(LineAmounts {
        subtotal,
        cgst,
        sgst,
        line_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{MAX_PRICE_CENTS, MAX_QUANTITY};
    use crate::{CoreError, ErrorKind};

    fn bps(v: u32) -> TaxRate {
        TaxRate::from_bps(v)
    }

    #[test]
    fn test_coffee_scenario() {
        let line = compute_line(Money::from_cents(10_000), 3, bps(500), bps(500)).unwrap();
        assert_eq!(line.subtotal.to_string(), "300.00");
        assert_eq!(line.cgst.to_string(), "15.00");
        assert_eq!(line.sgst.to_string(), "15.00");
        assert_eq!(line.line_total.to_string(), "330.00");
        assert_eq!(line.tax().to_string(), "30.00");
    }

    #[test]
    fn test_components_rounded_independently() {
        // 0.25 × 2.5% = 0.00625 → 0.01 per side; a merged 5% would round 0.0125 → 0.01
        let line = compute_line(Money::from_cents(25), 1, bps(250), bps(250)).unwrap();
        assert_eq!(line.cgst.cents(), 1);
        assert_eq!(line.sgst.cents(), 1);
        assert_eq!(line.line_total.cents(), 27);
    }

    #[test]
    fn test_asymmetric_rates() {
        let line = compute_line(Money::from_cents(999), 2, bps(600), bps(0)).unwrap();
        assert_eq!(line.subtotal.cents(), 1998);
        // 19.98 × 6% = 1.1988 → 1.20
        assert_eq!(line.cgst.cents(), 120);
        assert_eq!(line.sgst.cents(), 0);
        assert_eq!(line.line_total.cents(), 2118);
    }

    #[test]
    fn test_free_item() {
        let line = compute_line(Money::zero(), 5, bps(900), bps(900)).unwrap();
        assert!(line.line_total.is_zero());
    }

    #[test]
    fn test_line_total_identity_holds() {
        for price in [1, 7, 99, 101, 1234, 99_999] {
            for qty in [1, 2, 3, 17] {
                for rate in [0, 1, 250, 500, 600, 900, 1400, 10_000] {
                    let line = compute_line(Money::from_cents(price), qty, bps(rate), bps(rate))
                        .unwrap();
                    assert_eq!(line.subtotal.cents(), price * qty);
                    assert_eq!(line.line_total, line.subtotal + line.cgst + line.sgst);

                    // half-up: |exact - rounded| <= 0.5 minor units
                    let exact_x2 = 2 * line.subtotal.cents() as i128 * rate as i128;
                    let rounded_x2 = 2 * line.cgst.cents() as i128 * 10_000;
                    assert!((exact_x2 - rounded_x2).abs() <= 10_000);
                }
            }
        }
    }

    #[test]
    fn test_rejects_bad_quantity() {
        for qty in [0, -1] {
            let err = compute_line(Money::from_cents(100), qty, bps(500), bps(500)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_rejects_negative_price_and_bad_rate() {
        assert!(compute_line(Money::from_cents(-1), 1, bps(0), bps(0)).is_err());
        assert!(compute_line(Money::from_cents(100), 1, bps(10_001), bps(0)).is_err());
        assert!(compute_line(Money::from_cents(100), 1, bps(0), bps(10_001)).is_err());
    }

    #[test]
    fn test_rejects_oversize_price_and_quantity() {
        let err = compute_line(Money::from_cents(i64::MAX / 2), 3, bps(0), bps(0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = compute_line(Money::from_cents(100), MAX_QUANTITY + 1, bps(0), bps(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_largest_line_fits() {
        let line = compute_line(
            Money::from_cents(MAX_PRICE_CENTS),
            MAX_QUANTITY,
            bps(10_000),
            bps(10_000),
        )
        .unwrap();
        assert_eq!(line.line_total.cents(), MAX_PRICE_CENTS * MAX_QUANTITY * 3);
    }
}
