//! # Repository Module
//!
//! Database repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Command handler                                                       │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(product_id, 3)                         │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── validate input (no storage touched yet)                           │
//! │  └── Store::bounded("record_sale", ...) ← storage timeout              │
//! │           │                                                             │
//! │           │  BEGIN; lock product; INSERT sale; COMMIT                  │
//! │           ▼                                                             │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every repository shares one Store: pool + timeout + observer.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, retire, search
//! - [`SaleRepository`](sale::SaleRepository) - Sales ledger, reversals, reports
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value settings

pub mod product;
pub mod sale;
pub mod settings;

use std::future::Future;
use std::time::Duration;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::observe::SharedObserver;
use till_core::CoreError;

/// Storage handle shared by all repositories.
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
    pub(crate) timeout: Duration,
    pub(crate) observer: SharedObserver,
}

impl Store {
    pub(crate) fn new(pool: SqlitePool, timeout: Duration, observer: SharedObserver) -> Self {
        Store {
            pool,
            timeout,
            observer,
        }
    }

    /// Runs one storage operation under the storage timeout.
    ///
    /// On expiry the future is dropped; an open transaction inside it is
    /// dropped with it and rolls back. Storage-side failures are reported
    /// to the observer, domain rejections are not.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DbError::Timeout {
                operation,
                after: self.timeout,
            }),
        };

        if let Err(err) = &result {
            if err.as_domain().is_none() {
                self.observer.operation_failed(operation, err);
            }
        }

        result
    }
}

/// Takes the database write lock and proves the product exists.
///
/// A no-op UPDATE as the first statement of a transaction makes SQLite
/// acquire the write lock immediately, so the reads that follow see the
/// same catalog state the transaction will commit against.
pub(crate) async fn lock_product(conn: &mut SqliteConnection, product_id: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET updated_at = updated_at WHERE id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id).into());
    }

    Ok(())
}

/// Maps a UNIQUE violation on the product name to `DuplicateName`.
pub(crate) fn name_conflict(name: &str) -> impl FnOnce(sqlx::Error) -> DbError + '_ {
    move |err| match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::from(CoreError::DuplicateName(name.to_string())),
        other => other,
    }
}
