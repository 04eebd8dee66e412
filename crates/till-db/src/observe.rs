//! # Ledger Observation
//!
//! Ledger events are reported through an injected [`LedgerObserver`]
//! rather than a global logger, so tests can assert on exactly what the
//! ledger did.
//!
//! ```text
//! Database::with_observer(config, Arc<dyn LedgerObserver>)
//!      │
//!      ├──► ProductRepository ──► product_created / updated / retired / ...
//!      ├──► SaleRepository    ──► sale_recorded / sale_reversed
//!      └──► every repository  ──► operation_failed (storage-side errors)
//! ```

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::error::DbError;
use till_core::{Product, Sale, SaleReversal};

/// Receives ledger events after they are committed.
///
/// Every method has an empty default body, so implementations only
/// override what they care about.
pub trait LedgerObserver: Send + Sync + Debug {
    fn product_created(&self, _product: &Product) {}

    fn product_updated(&self, _product: &Product) {}

    fn product_retired(&self, _product_id: i64) {}

    fn product_reinstated(&self, _product_id: i64) {}

    fn product_deleted(&self, _product_id: i64) {}

    fn sale_recorded(&self, _sale: &Sale) {}

    fn sale_reversed(&self, _reversal: &SaleReversal) {}

    /// A storage operation failed. Domain rejections are not reported here.
    fn operation_failed(&self, _operation: &'static str, _error: &DbError) {}
}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn LedgerObserver>;

/// Production observer: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn product_created(&self, product: &Product) {
        info!(
            product_id = product.id,
            name = %product.name,
            price_cents = product.price_cents,
            "Product created"
        );
    }

    fn product_updated(&self, product: &Product) {
        info!(
            product_id = product.id,
            price_cents = product.price_cents,
            cgst_rate_bps = product.cgst_rate_bps,
            sgst_rate_bps = product.sgst_rate_bps,
            "Product updated"
        );
    }

    fn product_retired(&self, product_id: i64) {
        info!(product_id, "Product retired");
    }

    fn product_reinstated(&self, product_id: i64) {
        info!(product_id, "Product reinstated");
    }

    fn product_deleted(&self, product_id: i64) {
        info!(product_id, "Product deleted");
    }

    fn sale_recorded(&self, sale: &Sale) {
        info!(
            sale_id = sale.id,
            product_id = sale.product_id,
            quantity = sale.quantity,
            line_total_cents = sale.line_total_cents,
            "Sale recorded"
        );
    }

    fn sale_reversed(&self, reversal: &SaleReversal) {
        info!(
            sale_id = reversal.sale_id,
            reversal_id = reversal.id,
            "Sale reversed"
        );
    }

    fn operation_failed(&self, operation: &'static str, error: &DbError) {
        warn!(operation, error = %error, kind = ?error.kind(), "Storage operation failed");
    }
}

// =============================================================================
// Recording Observer
// =============================================================================

/// One event captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    ProductCreated(i64),
    ProductUpdated(i64),
    ProductRetired(i64),
    ProductReinstated(i64),
    ProductDeleted(i64),
    SaleRecorded(i64),
    SaleReversed(i64),
    OperationFailed(&'static str),
}

/// Observer that keeps every event in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far, oldest first.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl LedgerObserver for RecordingObserver {
    fn product_created(&self, product: &Product) {
        self.push(LedgerEvent::ProductCreated(product.id));
    }

    fn product_updated(&self, product: &Product) {
        self.push(LedgerEvent::ProductUpdated(product.id));
    }

    fn product_retired(&self, product_id: i64) {
        self.push(LedgerEvent::ProductRetired(product_id));
    }

    fn product_reinstated(&self, product_id: i64) {
        self.push(LedgerEvent::ProductReinstated(product_id));
    }

    fn product_deleted(&self, product_id: i64) {
        self.push(LedgerEvent::ProductDeleted(product_id));
    }

    fn sale_recorded(&self, sale: &Sale) {
        self.push(LedgerEvent::SaleRecorded(sale.id));
    }

    fn sale_reversed(&self, reversal: &SaleReversal) {
        self.push(LedgerEvent::SaleReversed(reversal.sale_id));
    }

    fn operation_failed(&self, operation: &'static str, _error: &DbError) {
        self.push(LedgerEvent::OperationFailed(operation));
    }
}
