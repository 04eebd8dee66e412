//! # Receipt Renderer
//!
//! Looks up a stored sale and projects it into a [`Receipt`]. The receipt
//! is built from the sale row alone, so rendering the same sale twice
//! yields identical output no matter what happened to the catalog or the
//! settings in between.

use tracing::debug;

use crate::error::DbResult;
use crate::repository::sale::SaleRepository;
use till_core::{CoreError, Receipt};

/// Renders receipts for stored sales.
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    sales: SaleRepository,
}

impl ReceiptRenderer {
    pub fn new(sales: SaleRepository) -> Self {
        ReceiptRenderer { sales }
    }

    /// Builds the receipt for `sale_id`.
    ///
    /// ## Returns
    /// * `Err(Domain(SaleNotFound))` - No such sale
    pub async fn render(&self, sale_id: i64) -> DbResult<Receipt> {
        debug!(sale_id, "Rendering receipt");

        let sale = self
            .sales
            .get_by_id(sale_id)
            .await?
            .ok_or(CoreError::SaleNotFound(sale_id))?;

        Ok(Receipt::from_sale(&sale))
    }

    /// Builds the receipt and renders it as fixed-width text.
    pub async fn render_text(&self, sale_id: i64) -> DbResult<String> {
        Ok(self.render(sale_id).await?.render_text())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
