//! # Product Repository
//!
//! The Catalog Store: the only writer of the `products` table.
//!
//! ## Product Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Lifecycle                                    │
//! │                                                                         │
//! │  create ──► ACTIVE ──── update (price, rates, name) ───► ACTIVE         │
//! │               │  ▲                                                      │
//! │        retire │  │ reinstate                                            │
//! │               ▼  │                                                      │
//! │             RETIRED  (hidden from catalog, cannot be sold,              │
//! │                       history and receipts intact)                      │
//! │                                                                         │
//! │  delete ──► only while NO sale references the product;                 │
//! │             otherwise ReferencedByHistory { sale_count }               │
//! │                                                                         │
//! │  Updates never touch recorded sales: every sale holds its own          │
//! │  snapshot of name, price and rates.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{lock_product, name_conflict, Store};
use till_core::validation::validate_search_query;
use till_core::{CoreError, Product, ProductDraft};

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let coffee = repo.create(&ProductDraft::new("Coffee", price, cgst, sgst)).await?;
/// let found = repo.get_by_name("coffee").await?; // case-insensitive
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: Store,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(store: Store) -> Self {
        ProductRepository { store }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored product with its assigned id
    /// * `Err(Domain(DuplicateName))` - Name already used (ignoring case)
    /// * `Err(Domain(Validation))` - Draft rejected, nothing written
    pub async fn create(&self, draft: &ProductDraft) -> DbResult<Product> {
        let draft = draft.validate()?;
        debug!(name = %draft.name, price_cents = draft.price_cents, "Creating product");

        let product = self
            .store
            .bounded("create_product", async {
                let now = Utc::now();
                let product = sqlx::query_as::<_, Product>(
                    r#"
                    INSERT INTO products (
                        name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps,
                        is_active, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
                    RETURNING
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    "#,
                )
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(draft.price_cents)
                .bind(draft.cgst_rate_bps)
                .bind(draft.sgst_rate_bps)
                .bind(now)
                .fetch_one(&self.store.pool)
                .await
                .map_err(name_conflict(&draft.name))?;

                Ok(product)
            })
            .await?;

        self.store.observer.product_created(&product);
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or retired)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        self.store
            .bounded("get_product", async {
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
                .bind(id)
                .fetch_optional(&self.store.pool)
                .await?;

                Ok(product)
            })
            .await
    }

    /// Gets a product by its display name, ignoring case and surrounding
    /// whitespace.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        self.store
            .bounded("get_product_by_name", async {
                // `name` carries COLLATE NOCASE, so `=` ignores ASCII case
                let product = sqlx::query_as::<_, Product>(
                    r#"
                    SELECT
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    FROM products
                    WHERE name = ?1
                    "#,
                )
                .bind(name)
                .fetch_optional(&self.store.pool)
                .await?;

                Ok(product)
            })
            .await
    }

    /// Lists the catalog ordered by name.
    ///
    /// Retired products are included only when `include_retired` is set.
    pub async fn list_all(&self, include_retired: bool) -> DbResult<Vec<Product>> {
        self.store
            .bounded("list_products", async {
                let products = sqlx::query_as::<_, Product>(
                    r#"
                    SELECT
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    FROM products
                    WHERE ?1 OR is_active = 1
                    ORDER BY name, id
                    "#,
                )
                .bind(include_retired)
                .fetch_all(&self.store.pool)
                .await?;

                debug!(count = products.len(), include_retired, "Listed products");
                Ok(products)
            })
            .await
    }

    /// Searches active products whose name contains `fragment`.
    ///
    /// ## Arguments
    /// * `fragment` - Case-insensitive substring; empty lists everything
    /// * `limit` - Maximum results, clamped to 1..=100
    pub async fn search(&self, fragment: &str, limit: u32) -> DbResult<Vec<Product>> {
        let fragment = validate_search_query(fragment)?;
        let limit = limit.clamp(1, 100);

        debug!(query = %fragment, limit, "Searching products");

        let pattern = format!("%{}%", escape_like(&fragment));

        self.store
            .bounded("search_products", async {
                let products = sqlx::query_as::<_, Product>(
                    r#"
                    SELECT
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    FROM products
                    WHERE is_active = 1
                      AND name LIKE ?1 ESCAPE '\'
                    ORDER BY name, id
                    LIMIT ?2
                    "#,
                )
                .bind(&pattern)
                .bind(limit)
                .fetch_all(&self.store.pool)
                .await?;

                debug!(count = products.len(), "Search returned products");
                Ok(products)
            })
            .await
    }

    /// Replaces the writable fields of an existing product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(Domain(ProductNotFound))` - No such id; nothing is inserted
    /// * `Err(Domain(DuplicateName))` - Renamed onto another product's name
    pub async fn update(&self, id: i64, draft: &ProductDraft) -> DbResult<Product> {
        let draft = draft.validate()?;
        debug!(id, name = %draft.name, "Updating product");

        let product = self
            .store
            .bounded("update_product", async {
                sqlx::query_as::<_, Product>(
                    r#"
                    UPDATE products SET
                        name = ?2,
                        description = ?3,
                        price_cents = ?4,
                        cgst_rate_bps = ?5,
                        sgst_rate_bps = ?6,
                        updated_at = ?7
                    WHERE id = ?1
                    RETURNING
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    "#,
                )
                .bind(id)
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(draft.price_cents)
                .bind(draft.cgst_rate_bps)
                .bind(draft.sgst_rate_bps)
                .bind(Utc::now())
                .fetch_optional(&self.store.pool)
                .await
                .map_err(name_conflict(&draft.name))?
                .ok_or_else(|| DbError::from(CoreError::ProductNotFound(id)))
            })
            .await?;

        self.store.observer.product_updated(&product);
        Ok(product)
    }

    /// Hides a product from the active catalog. History is untouched and
    /// the product can no longer be sold.
    pub async fn retire(&self, id: i64) -> DbResult<Product> {
        let product = self.set_active(id, false, "retire_product").await?;
        self.store.observer.product_retired(id);
        Ok(product)
    }

    /// Returns a retired product to the active catalog.
    pub async fn reinstate(&self, id: i64) -> DbResult<Product> {
        let product = self.set_active(id, true, "reinstate_product").await?;
        self.store.observer.product_reinstated(id);
        Ok(product)
    }

    async fn set_active(
        &self,
        id: i64,
        active: bool,
        operation: &'static str,
    ) -> DbResult<Product> {
        debug!(id, active, "Setting product active flag");

        self.store
            .bounded(operation, async {
                sqlx::query_as::<_, Product>(
                    r#"
                    UPDATE products SET
                        is_active = ?2,
                        updated_at = ?3
                    WHERE id = ?1
                    RETURNING
                        id, name, description, price_cents,
                        cgst_rate_bps, sgst_rate_bps, is_active,
                        created_at, updated_at
                    "#,
                )
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .fetch_optional(&self.store.pool)
                .await?
                .ok_or_else(|| DbError::from(CoreError::ProductNotFound(id)))
            })
            .await
    }

    /// Removes a product that no sale references.
    ///
    /// ## Referential Guard
    /// ```text
    /// BEGIN
    ///   lock product row        ─► missing? ProductNotFound
    ///   COUNT sales referencing ─► > 0?     ReferencedByHistory { sale_count }
    ///   DELETE
    /// COMMIT
    /// ```
    /// The foreign key (`ON DELETE RESTRICT`) backs this up at the schema
    /// level.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        self.store
            .bounded("delete_product", async {
                let mut tx = self.store.pool.begin().await?;

                lock_product(&mut tx, id).await?;

                let sale_count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE product_id = ?1")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;

                if sale_count > 0 {
                    return Err(CoreError::ReferencedByHistory {
                        product_id: id,
                        sale_count,
                    }
                    .into());
                }

                sqlx::query("DELETE FROM products WHERE id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;
                Ok(())
            })
            .await?;

        self.store.observer.product_deleted(id);
        Ok(())
    }

    /// Counts all products, active and retired.
    pub async fn count(&self) -> DbResult<i64> {
        self.store
            .bounded("count_products", async {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
                    .fetch_one(&self.store.pool)
                    .await?;
                Ok(count)
            })
            .await
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
