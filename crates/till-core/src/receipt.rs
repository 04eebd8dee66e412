//! # Receipt Projection
//!
//! A receipt is a read-only view of one stored sale. Every figure on it is
//! copied from the sale snapshot; nothing is recomputed and nothing is read
//! from the live catalog or settings.
//!
//! ## Layout (40 columns)
//! ```text
//! ========================================
//! RECEIPT                         S-000042
//! 2026-03-01 09:15:00 UTC
//! ----------------------------------------
//! Coffee
//!   3 x 100.00                      300.00
//! ----------------------------------------
//! Subtotal                          300.00
//! CGST @ 5%                          15.00
//! SGST @ 5%                          15.00
//! ========================================
//! TOTAL                             330.00
//! ========================================
//! ```
//!
//! Same sale in, same bytes out. Printers and archives rely on that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};
use crate::types::Sale;

/// Printable width of [`Receipt::render_text`].
pub const RECEIPT_WIDTH: usize = 40;

/// The item line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// unit price × quantity, before tax.
    pub amount: Money,
}

/// One tax component as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxLine {
    /// `CGST` or `SGST`.
    pub label: String,
    pub rate: TaxRate,
    pub amount: Money,
}

/// Receipt for a single sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub receipt_number: String,
    pub sale_id: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    pub line: ReceiptLine,
    pub subtotal: Money,
    pub taxes: Vec<TaxLine>,
    pub total: Money,
}

impl Receipt {
    /// Projects a stored sale.
    pub fn from_sale(sale: &Sale) -> Self {
        Receipt {
            receipt_number: sale.receipt_number(),
            sale_id: sale.id,
            sold_at: sale.sold_at,
            line: ReceiptLine {
                name: sale.product_name.clone(),
                quantity: sale.quantity,
                unit_price: sale.unit_price(),
                amount: sale.subtotal(),
            },
            subtotal: sale.subtotal(),
            taxes: vec![
                TaxLine {
                    label: "CGST".to_string(),
                    rate: sale.cgst_rate(),
                    amount: sale.cgst(),
                },
                TaxLine {
                    label: "SGST".to_string(),
                    rate: sale.sgst_rate(),
                    amount: sale.sgst(),
                },
            ],
            total: sale.line_total(),
        }
    }

    /// Sum of all tax lines.
    pub fn tax_total(&self) -> Money {
        self.taxes.iter().map(|t| t.amount).sum()
    }

    /// Renders the fixed-width plain-text receipt.
    ///
    /// Every line is exactly [`RECEIPT_WIDTH`] characters or shorter and the
    /// output ends with a newline.
    pub fn render_text(&self) -> String {
        let double = "=".repeat(RECEIPT_WIDTH);
        let single = "-".repeat(RECEIPT_WIDTH);

        let mut lines = vec![
            double.clone(),
            row("RECEIPT", &self.receipt_number),
            self.sold_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            single.clone(),
            truncate(&self.line.name, RECEIPT_WIDTH),
            row(
                &format!("  {} x {}", self.line.quantity, self.line.unit_price),
                &self.line.amount.to_string(),
            ),
            single,
            row("Subtotal", &self.subtotal.to_string()),
        ];

        for tax in &self.taxes {
            lines.push(row(
                &format!("{} @ {}", tax.label, tax.rate),
                &tax.amount.to_string(),
            ));
        }

        lines.push(double.clone());
        lines.push(row("TOTAL", &self.total.to_string()));
        lines.push(double);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Left text and right-aligned value on one line; the left side gives way.
fn row(left: &str, right: &str) -> String {
    let right_len = right.chars().count();
    let room = RECEIPT_WIDTH.saturating_sub(right_len + 1);
    let left = truncate(left, room);
    let pad = RECEIPT_WIDTH.saturating_sub(left.chars().count() + right_len);
    format!("{}{}{}", left, " ".repeat(pad), right)
}

/// Clips to `max` characters. Control characters print as spaces so a
/// stored name can never break the line layout.
fn truncate(s: &str, max: usize) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coffee_sale() -> Sale {
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
            sold_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 15, 0).unwrap(),
        }
    }

    #[test]
    fn test_from_sale_copies_snapshot() {
        let receipt = Receipt::from_sale(&coffee_sale());
        assert_eq!(receipt.receipt_number, "S-000042");
        assert_eq!(receipt.line.name, "Coffee");
        assert_eq!(receipt.subtotal.cents(), 30_000);
        assert_eq!(receipt.tax_total().cents(), 3_000);
        assert_eq!(receipt.total.cents(), 33_000);
        assert_eq!(receipt.taxes[0].label, "CGST");
        assert_eq!(receipt.taxes[1].rate.bps(), 500);
    }

    #[test]
    fn test_render_text_layout() {
        let text = Receipt::from_sale(&coffee_sale()).render_text();
        let expected = "\
========================================
RECEIPT                         S-000042
2026-03-01 09:15:00 UTC
----------------------------------------
Coffee
  3 x 100.00                      300.00
----------------------------------------
Subtotal                          300.00
CGST @ 5%                          15.00
SGST @ 5%                          15.00
========================================
TOTAL                             330.00
========================================
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_is_stable() {
        let sale = coffee_sale();
        let first = Receipt::from_sale(&sale).render_text();
        let second = Receipt::from_sale(&sale).render_text();
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_name_stays_within_width() {
        let mut sale = coffee_sale();
        sale.product_name = "Extra Large Hazelnut Caramel Oat Milk Cappuccino".to_string();
        let text = Receipt::from_sale(&sale).render_text();
        assert!(text.lines().all(|l| l.chars().count() <= RECEIPT_WIDTH));
    }

    #[test]
    fn test_control_characters_in_name_stay_on_one_line() {
        let mut sale = coffee_sale();
        sale.product_name = "Tea\n========\nTOTAL\t0.00\r".to_string();

        let normal = Receipt::from_sale(&coffee_sale()).render_text();
        let text = Receipt::from_sale(&sale).render_text();

        assert_eq!(text.lines().count(), normal.lines().count());
        assert!(text.lines().all(|l| l.chars().count() <= RECEIPT_WIDTH));
        assert!(text.lines().all(|l| !l.chars().any(char::is_control)));
        assert_eq!(text.lines().filter(|l| l.starts_with("TOTAL")).count(), 1);
    }

    #[test]
    fn test_row_alignment() {
        assert_eq!(row("A", "1.00").len(), RECEIPT_WIDTH);
        let long = row(&"x".repeat(60), "123.45");
        assert_eq!(long.chars().count(), RECEIPT_WIDTH);
        assert!(long.ends_with(" 123.45"));
    }
}
