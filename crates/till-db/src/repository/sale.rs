//! # Sale Repository
//!
//! The Sales Ledger: records sales as immutable snapshots, appends
//! reversals, and answers history queries.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      record_sale(product_id, qty)                       │
//! │                                                                         │
//! │  1. validate qty > 0 ───────────────────────► InvalidInput (no I/O)    │
//! │       │                                                                 │
//! │  2. BEGIN                                                               │
//! │     lock product row (write lock) ──────────► NotFound                  │
//! │     read name, price, CGST, SGST                                        │
//! │     retired? ───────────────────────────────► InvalidInput              │
//! │       │                                                                 │
//! │  3. compute_line(price, qty, cgst, sgst)   (till-core, pure)           │
//! │       │                                                                 │
//! │  4. INSERT sales (snapshot + sold_at)                                   │
//! │       │                                                                 │
//! │  5. COMMIT ─► Sale { id, ... }                                          │
//! │                                                                         │
//! │  Any failure or timeout before COMMIT drops the transaction:           │
//! │  no partial row is ever visible.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Corrections
//! Sales are never updated or deleted. A mistake is corrected by appending
//! a [`SaleReversal`]; `replace_sale` does reverse + re-sell atomically.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{lock_product, Store};
use till_core::validation::{validate_optional_text, validate_quantity};
use till_core::{
    compute_line, CoreError, Product, Sale, SaleFilter, SaleReversal, SalesSummary,
    ValidationError,
};

/// Repository for the sales ledger.
///
/// ## Usage
/// ```rust,ignore
/// let sale = db.sales().record_sale(coffee.id, 3).await?;
/// assert_eq!(sale.line_total_cents, 33_000);
///
/// let today = db.sales().summary(&SaleFilter::default().between(start, end)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    store: Store,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(store: Store) -> Self {
        SaleRepository { store }
    }

    /// Records one sale line against the product's current catalog entry.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - Persisted sale with its id and snapshot
    /// * `Err(Domain(Validation))` - quantity <= 0; storage untouched
    /// * `Err(Domain(ProductNotFound))` - No such product; no row written
    /// * `Err(Domain(ProductRetired))` - Product retired; no row written
    /// * `Err(Timeout)` - Storage did not answer in time; rolled back
    pub async fn record_sale(&self, product_id: i64, quantity: i64) -> DbResult<Sale> {
        validate_quantity(quantity)?;
        debug!(product_id, quantity, "Recording sale");

        let sale = self
            .store
            .bounded("record_sale", async {
                let mut tx = self.store.pool.begin().await?;
                let sale = insert_sale(&mut tx, product_id, quantity).await?;
                tx.commit().await?;
                Ok(sale)
            })
            .await?;

        self.store.observer.sale_recorded(&sale);
        Ok(sale)
    }

    /// Appends a reversal for a sale. The sale row itself is untouched.
    ///
    /// ## Returns
    /// * `Err(Domain(SaleNotFound))` - No such sale
    /// * `Err(Domain(AlreadyReversed))` - The sale already has a reversal
    pub async fn reverse_sale(&self, sale_id: i64, reason: Option<&str>) -> DbResult<SaleReversal> {
        let reason = validate_optional_text("reason", reason)?;
        debug!(sale_id, "Reversing sale");

        let reversal = self
            .store
            .bounded("reverse_sale", async {
                let mut tx = self.store.pool.begin().await?;
                let reversal = insert_reversal(&mut tx, sale_id, reason.as_deref()).await?;
                tx.commit().await?;
                Ok(reversal)
            })
            .await?;

        self.store.observer.sale_reversed(&reversal);
        Ok(reversal)
    }

    /// Replaces a sale: reverses it and records a new sale at the current
    /// catalog price, in one transaction. Either both rows land or neither.
    pub async fn replace_sale(
        &self,
        sale_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> DbResult<(SaleReversal, Sale)> {
        validate_quantity(quantity)?;
        debug!(sale_id, product_id, quantity, "Replacing sale");

        let (reversal, sale) = self
            .store
            .bounded("replace_sale", async {
                let mut tx = self.store.pool.begin().await?;
                let sale = insert_sale(&mut tx, product_id, quantity).await?;
                let reason = format!("Replaced by sale {}", sale.id);
                let reversal = insert_reversal(&mut tx, sale_id, Some(&reason)).await?;
                tx.commit().await?;
                Ok((reversal, sale))
            })
            .await?;

        self.store.observer.sale_reversed(&reversal);
        self.store.observer.sale_recorded(&sale);
        Ok((reversal, sale))
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        self.store
            .bounded("get_sale", async {
                let sale = sqlx::query_as::<_, Sale>(
                    r#"
                    SELECT
                        id, product_id, product_name, quantity,
                        unit_price_cents, cgst_rate_bps, sgst_rate_bps,
                        subtotal_cents, cgst_cents, sgst_cents,
                        line_total_cents, sold_at
                    FROM sales
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.store.pool)
                .await?;

                Ok(sale)
            })
            .await
    }

    /// Gets the reversal of a sale, if it has one.
    pub async fn get_reversal(&self, sale_id: i64) -> DbResult<Option<SaleReversal>> {
        self.store
            .bounded("get_reversal", async {
                let reversal = sqlx::query_as::<_, SaleReversal>(
                    r#"
                    SELECT id, sale_id, reason, reversed_at
                    FROM sale_reversals
                    WHERE sale_id = ?1
                    "#,
                )
                .bind(sale_id)
                .fetch_optional(&self.store.pool)
                .await?;

                Ok(reversal)
            })
            .await
    }

    /// Lists sales matching the filter, oldest first (`sold_at`, then `id`).
    pub async fn list_sales(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        self.store
            .bounded("list_sales", async {
                let mut query = QueryBuilder::<Sqlite>::new(
                    r#"
                    SELECT
                        s.id, s.product_id, s.product_name, s.quantity,
                        s.unit_price_cents, s.cgst_rate_bps, s.sgst_rate_bps,
                        s.subtotal_cents, s.cgst_cents, s.sgst_cents,
                        s.line_total_cents, s.sold_at
                    FROM sales s
                    WHERE 1 = 1
                    "#,
                );
                push_filter(&mut query, filter);
                query.push(" ORDER BY s.sold_at ASC, s.id ASC");

                let sales = query
                    .build_query_as::<Sale>()
                    .fetch_all(&self.store.pool)
                    .await?;

                debug!(count = sales.len(), "Listed sales");
                Ok(sales)
            })
            .await
    }

    /// Aggregates the matching sales. Totals exclude reversed sales;
    /// `sale_count` includes them and `reversed_count` says how many.
    pub async fn summary(&self, filter: &SaleFilter) -> DbResult<SalesSummary> {
        self.store
            .bounded("sales_summary", async {
                let mut query = QueryBuilder::<Sqlite>::new(
                    r#"
                    SELECT
                        COUNT(*) AS sale_count,
                        COUNT(r.id) AS reversed_count,
                        COALESCE(SUM(CASE WHEN r.id IS NULL THEN s.subtotal_cents ELSE 0 END), 0)
                            AS subtotal_cents,
                        COALESCE(SUM(CASE WHEN r.id IS NULL THEN s.cgst_cents ELSE 0 END), 0)
                            AS cgst_cents,
                        COALESCE(SUM(CASE WHEN r.id IS NULL THEN s.sgst_cents ELSE 0 END), 0)
                            AS sgst_cents,
                        COALESCE(SUM(CASE WHEN r.id IS NULL THEN s.line_total_cents ELSE 0 END), 0)
                            AS total_cents
                    FROM sales s
                    LEFT JOIN sale_reversals r ON r.sale_id = s.id
                    WHERE 1 = 1
                    "#,
                );
                push_filter(&mut query, filter);

                let summary = query
                    .build_query_as::<SalesSummary>()
                    .fetch_one(&self.store.pool)
                    .await
                    .map_err(summary_error)?;

                Ok(summary)
            })
            .await
    }
}

/// SQLite's integer `SUM` aborts with "integer overflow" once a total no
/// longer fits in 64 bits. That is a property of the requested window, not
/// a storage fault.
fn summary_error(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::QueryFailed(msg) if msg.contains("integer overflow") => {
            DbError::from(CoreError::from(ValidationError::Overflow {
                field: "total".to_string(),
            }))
        }
        other => other,
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Snapshots the product and inserts one sale row. Runs inside the
/// caller's transaction.
async fn insert_sale(conn: &mut SqliteConnection, product_id: i64, quantity: i64) -> DbResult<Sale> {
    lock_product(conn, product_id).await?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, name, description, price_cents,
            cgst_rate_bps, sgst_rate_bps, is_active,
            created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    if !product.is_active {
        return Err(CoreError::ProductRetired(product_id).into());
    }

    let line = compute_line(
        product.price(),
        quantity,
        product.cgst_rate(),
        product.sgst_rate(),
    )?;

    let sale = sqlx::query_as::<_, Sale>(
        r#"
        INSERT INTO sales (
            product_id, product_name, quantity,
            unit_price_cents, cgst_rate_bps, sgst_rate_bps,
            subtotal_cents, cgst_cents, sgst_cents,
            line_total_cents, sold_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        RETURNING
            id, product_id, product_name, quantity,
            unit_price_cents, cgst_rate_bps, sgst_rate_bps,
            subtotal_cents, cgst_cents, sgst_cents,
            line_total_cents, sold_at
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(quantity)
    .bind(product.price_cents)
    .bind(product.cgst_rate_bps)
    .bind(product.sgst_rate_bps)
    .bind(line.subtotal.cents())
    .bind(line.cgst.cents())
    .bind(line.sgst.cents())
    .bind(line.line_total.cents())
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(sale)
}

/// Appends a reversal row, in one statement that also proves the sale
/// exists. The UNIQUE index on `sale_id` rejects a second reversal.
async fn insert_reversal(
    conn: &mut SqliteConnection,
    sale_id: i64,
    reason: Option<&str>,
) -> DbResult<SaleReversal> {
    let reversal = sqlx::query_as::<_, SaleReversal>(
        r#"
        INSERT INTO sale_reversals (sale_id, reason, reversed_at)
        SELECT ?1, ?2, ?3
        WHERE EXISTS (SELECT 1 FROM sales WHERE id = ?1)
        RETURNING id, sale_id, reason, reversed_at
        "#,
    )
    .bind(sale_id)
    .bind(reason)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|err| match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::from(CoreError::AlreadyReversed(sale_id)),
        other => other,
    })?;

    reversal.ok_or_else(|| CoreError::SaleNotFound(sale_id).into())
}

/// Appends the WHERE clauses of a [`SaleFilter`]; `s` is the sales alias.
fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    if let Some(from) = filter.from {
        query.push(" AND s.sold_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND s.sold_at < ").push_bind(to);
    }
    if let Some(product_id) = filter.product_id {
        query.push(" AND s.product_id = ").push_bind(product_id);
    }
    if filter.exclude_reversed {
        query.push(" AND NOT EXISTS (SELECT 1 FROM sale_reversals x WHERE x.sale_id = s.id)");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
