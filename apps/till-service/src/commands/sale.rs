//! # Sale Commands
//!
//! Recording, reading, reversing and replacing sales, plus summaries and
//! receipts.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  record_sale ──► Sale (snapshot of price + rates + amounts)            │
//! │                    │                                                    │
//! │                    ├──► get_sale / get_receipt   (read forever)        │
//! │                    │                                                    │
//! │                    ├──► reverse_sale  ──► SaleReversal (append-only)   │
//! │                    │                                                    │
//! │                    └──► replace_sale  ──► SaleReversal + new Sale      │
//! │                                           (one transaction)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{checked_id, IdArgs};
use crate::error::ApiResult;
use crate::state::AppState;
use till_core::{CoreError, Receipt, Sale, SaleFilter, SaleReversal, SalesSummary};

// =============================================================================
// DTOs
// =============================================================================

/// Sale DTO. Amounts are decimal strings taken from the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDto {
    pub id: i64,
    pub receipt_number: String,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub cgst_rate: String,
    pub sgst_rate: String,
    pub subtotal: String,
    pub cgst: String,
    pub sgst: String,
    pub line_total: String,
    pub line_total_cents: i64,
    pub sold_at: String,
}

impl From<Sale> for SaleDto {
    fn from(s: Sale) -> Self {
        SaleDto {
            id: s.id,
            receipt_number: s.receipt_number(),
            product_id: s.product_id,
            quantity: s.quantity,
            unit_price: s.unit_price().to_string(),
            cgst_rate: s.cgst_rate().to_string(),
            sgst_rate: s.sgst_rate().to_string(),
            subtotal: s.subtotal().to_string(),
            cgst: s.cgst().to_string(),
            sgst: s.sgst().to_string(),
            line_total: s.line_total().to_string(),
            line_total_cents: s.line_total_cents,
            sold_at: s.sold_at.to_rfc3339(),
            product_name: s.product_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalDto {
    pub id: i64,
    pub sale_id: i64,
    pub reason: Option<String>,
    pub reversed_at: String,
}

impl From<SaleReversal> for ReversalDto {
    fn from(r: SaleReversal) -> Self {
        ReversalDto {
            id: r.id,
            sale_id: r.sale_id,
            reason: r.reason,
            reversed_at: r.reversed_at.to_rfc3339(),
        }
    }
}

/// A sale together with its reversal, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailDto {
    #[serde(flatten)]
    pub sale: SaleDto,
    pub reversal: Option<ReversalDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementDto {
    pub reversal: ReversalDto,
    pub sale: SaleDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub sale_count: i64,
    pub reversed_count: i64,
    pub net_count: i64,
    pub subtotal: String,
    pub cgst: String,
    pub sgst: String,
    pub total: String,
}

impl From<SalesSummary> for SummaryDto {
    fn from(s: SalesSummary) -> Self {
        SummaryDto {
            sale_count: s.sale_count,
            reversed_count: s.reversed_count,
            net_count: s.net_count(),
            subtotal: till_core::Money::from_cents(s.subtotal_cents).to_string(),
            cgst: till_core::Money::from_cents(s.cgst_cents).to_string(),
            sgst: till_core::Money::from_cents(s.sgst_cents).to_string(),
            total: s.total().to_string(),
        }
    }
}

/// Receipt DTO: the structured receipt plus its printable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDto {
    pub receipt_number: String,
    pub sale_id: i64,
    pub total: String,
    pub text: String,
    pub receipt: Receipt,
}

impl From<Receipt> for ReceiptDto {
    fn from(receipt: Receipt) -> Self {
        ReceiptDto {
            receipt_number: receipt.receipt_number.clone(),
            sale_id: receipt.sale_id,
            total: receipt.total.to_string(),
            text: receipt.render_text(),
            receipt,
        }
    }
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleArgs {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSaleArgs {
    pub id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSaleArgs {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// Window and filters for `list_sales` / `sales_summary`.
/// `from` is inclusive, `to` exclusive, both RFC 3339.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleQueryArgs {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub product_id: Option<i64>,
    pub exclude_reversed: bool,
}

impl From<SaleQueryArgs> for SaleFilter {
    fn from(args: SaleQueryArgs) -> Self {
        SaleFilter {
            from: args.from,
            to: args.to,
            product_id: args.product_id,
            exclude_reversed: args.exclude_reversed,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Records a sale at the product's current catalog price.
pub async fn record_sale(state: &AppState, args: RecordSaleArgs) -> ApiResult<SaleDto> {
    debug!(product_id = args.product_id, quantity = args.quantity, "record_sale command");

    let sale = state
        .db
        .sales()
        .record_sale(checked_id("productId", args.product_id)?, args.quantity)
        .await?;

    info!(sale_id = sale.id, line_total = %sale.line_total(), "Sale recorded");
    Ok(sale.into())
}

/// Gets a sale and its reversal.
pub async fn get_sale(state: &AppState, args: IdArgs) -> ApiResult<SaleDetailDto> {
    debug!(id = args.id, "get_sale command");
    let id = args.checked()?;

    let sales = state.db.sales();
    let sale = sales
        .get_by_id(id)
        .await?
        .ok_or(CoreError::SaleNotFound(id))?;
    let reversal = sales.get_reversal(id).await?;

    Ok(SaleDetailDto {
        sale: sale.into(),
        reversal: reversal.map(ReversalDto::from),
    })
}

/// Lists sales in `sold_at` order.
pub async fn list_sales(state: &AppState, args: SaleQueryArgs) -> ApiResult<Vec<SaleDto>> {
    debug!(?args, "list_sales command");

    let sales = state.db.sales().list_sales(&args.into()).await?;
    Ok(sales.into_iter().map(SaleDto::from).collect())
}

/// Totals over the window. Reversed sales are counted but not summed.
pub async fn sales_summary(state: &AppState, args: SaleQueryArgs) -> ApiResult<SummaryDto> {
    debug!(?args, "sales_summary command");

    let summary = state.db.sales().summary(&args.into()).await?;
    Ok(summary.into())
}

pub async fn reverse_sale(state: &AppState, args: ReverseSaleArgs) -> ApiResult<ReversalDto> {
    debug!(id = args.id, "reverse_sale command");

    let reversal = state
        .db
        .sales()
        .reverse_sale(checked_id("id", args.id)?, args.reason.as_deref())
        .await?;
    Ok(reversal.into())
}

/// Reverses a sale and records its replacement atomically.
pub async fn replace_sale(state: &AppState, args: ReplaceSaleArgs) -> ApiResult<ReplacementDto> {
    debug!(id = args.id, product_id = args.product_id, "replace_sale command");

    let id = checked_id("id", args.id)?;
    let product_id = checked_id("productId", args.product_id)?;
    let (reversal, sale) = state
        .db
        .sales()
        .replace_sale(id, product_id, args.quantity)
        .await?;

    Ok(ReplacementDto {
        reversal: reversal.into(),
        sale: sale.into(),
    })
}

pub async fn get_receipt(state: &AppState, args: IdArgs) -> ApiResult<ReceiptDto> {
    debug!(id = args.id, "get_receipt command");
    let id = args.checked()?;

    let receipt = state.db.receipts().render(id).await?;
    Ok(receipt.into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{create_product, ProductInput};
    use crate::error::ErrorCode;
    use till_db::{Database, DbConfig};

    async fn state_with_coffee() -> (AppState, i64) {
        let state = AppState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let coffee = create_product(
            &state,
            ProductInput {
                name: "Coffee".to_string(),
                description: None,
                price: "100".to_string(),
                cgst_rate: "5".to_string(),
                sgst_rate: "5".to_string(),
            },
        )
        .await
        .unwrap();
        (state, coffee.id)
    }

    #[tokio::test]
    async fn test_coffee_sale_amounts() {
        let (state, coffee) = state_with_coffee().await;
        let sale = record_sale(
            &state,
            RecordSaleArgs {
                product_id: coffee,
                quantity: 3,
            },
        )
        .await
        .unwrap();

        assert_eq!(sale.subtotal, "300.00");
        assert_eq!(sale.cgst, "15.00");
        assert_eq!(sale.sgst, "15.00");
        assert_eq!(sale.line_total, "330.00");
        assert_eq!(sale.receipt_number, format!("S-{:06}", sale.id));
    }

    #[tokio::test]
    async fn test_missing_product_and_zero_quantity() {
        let (state, coffee) = state_with_coffee().await;

        let err = record_sale(
            &state,
            RecordSaleArgs {
                product_id: 999,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = record_sale(
            &state,
            RecordSaleArgs {
                product_id: coffee,
                quantity: 0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let summary = sales_summary(&state, SaleQueryArgs::default()).await.unwrap();
        assert_eq!(summary.sale_count, 0);
    }

    #[tokio::test]
    async fn test_reverse_then_summary_and_detail() {
        let (state, coffee) = state_with_coffee().await;
        let kept = record_sale(&state, RecordSaleArgs { product_id: coffee, quantity: 1 })
            .await
            .unwrap();
        let voided = record_sale(&state, RecordSaleArgs { product_id: coffee, quantity: 2 })
            .await
            .unwrap();

        reverse_sale(
            &state,
            ReverseSaleArgs {
                id: voided.id,
                reason: Some("customer changed mind".to_string()),
            },
        )
        .await
        .unwrap();

        let summary = sales_summary(&state, SaleQueryArgs::default()).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.reversed_count, 1);
        assert_eq!(summary.net_count, 1);
        assert_eq!(summary.total, kept.line_total);

        let detail = get_sale(&state, IdArgs { id: voided.id }).await.unwrap();
        assert_eq!(
            detail.reversal.unwrap().reason.as_deref(),
            Some("customer changed mind")
        );

        let listed = list_sales(
            &state,
            SaleQueryArgs {
                exclude_reversed: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed, vec![kept]);
    }

    #[tokio::test]
    async fn test_replace_and_receipt() {
        let (state, coffee) = state_with_coffee().await;
        let original = record_sale(&state, RecordSaleArgs { product_id: coffee, quantity: 1 })
            .await
            .unwrap();

        let replaced = replace_sale(
            &state,
            ReplaceSaleArgs {
                id: original.id,
                product_id: coffee,
                quantity: 3,
            },
        )
        .await
        .unwrap();
        assert_eq!(replaced.reversal.sale_id, original.id);
        assert_eq!(replaced.sale.line_total, "330.00");

        let receipt = get_receipt(&state, IdArgs { id: replaced.sale.id }).await.unwrap();
        assert_eq!(receipt.total, "330.00");
        assert!(receipt.text.contains(&receipt.receipt_number));

        let err = get_receipt(&state, IdArgs { id: 404 }).await.unwrap_err();
        assert_eq!(err.status, 404);
    }
}
