//! # Settings Repository
//!
//! Flat key/value business settings (`business_name`, `currency_code`, ...).
//! Writes are last-write-wins; nothing else in the ledger reads them, so a
//! settings change can never alter a stored sale or its receipt.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::Store;
use till_core::validation::{validate_setting_key, validate_setting_value};
use till_core::Setting;

/// Repository for business settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    store: Store,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(store: Store) -> Self {
        SettingsRepository { store }
    }

    /// Gets one value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.store
            .bounded("get_setting", async {
                let value: Option<String> =
                    sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                        .bind(key)
                        .fetch_optional(&self.store.pool)
                        .await?;
                Ok(value)
            })
            .await
    }

    /// Lists every setting ordered by key.
    pub async fn list(&self) -> DbResult<Vec<Setting>> {
        self.store
            .bounded("list_settings", async {
                let settings = sqlx::query_as::<_, Setting>(
                    "SELECT key, value, updated_at FROM settings ORDER BY key",
                )
                .fetch_all(&self.store.pool)
                .await?;
                Ok(settings)
            })
            .await
    }

    /// Inserts or overwrites one value.
    pub async fn put(&self, key: &str, value: &str) -> DbResult<Setting> {
        validate_setting_key(key)?;
        validate_setting_value(value)?;
        debug!(key, "Writing setting");

        self.store
            .bounded("put_setting", async {
                let mut conn = self.store.pool.acquire().await?;
                upsert(&mut conn, key, value).await
            })
            .await
    }

    /// Writes several values in one transaction: all of them or none.
    pub async fn put_many(&self, values: &BTreeMap<String, String>) -> DbResult<Vec<Setting>> {
        for (key, value) in values {
            validate_setting_key(key)?;
            validate_setting_value(value)?;
        }
        debug!(count = values.len(), "Writing settings");

        self.store
            .bounded("put_settings", async {
                let mut tx = self.store.pool.begin().await?;
                let mut written = Vec::with_capacity(values.len());
                for (key, value) in values {
                    written.push(upsert(&mut tx, key, value).await?);
                }
                tx.commit().await?;
                Ok(written)
            })
            .await
    }

    /// Removes a key. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        self.store
            .bounded("delete_setting", async {
                let result = sqlx::query("DELETE FROM settings WHERE key = ?1")
                    .bind(key)
                    .execute(&self.store.pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }
}

async fn upsert(conn: &mut SqliteConnection, key: &str, value: &str) -> DbResult<Setting> {
    let setting = sqlx::query_as::<_, Setting>(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        RETURNING key, value, updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(setting)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use till_core::ErrorKind;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        assert_eq!(settings.get("business_name").await.unwrap(), None);

        settings.put("business_name", "Chai Point").await.unwrap();
        settings.put("business_name", "Chai Corner").await.unwrap();

        assert_eq!(
            settings.get("business_name").await.unwrap().as_deref(),
            Some("Chai Corner")
        );
        assert_eq!(settings.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_many_is_all_or_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        let mut values = BTreeMap::new();
        values.insert("currency_code".to_string(), "INR".to_string());
        values.insert("Bad Key".to_string(), "x".to_string());

        let err = settings.put_many(&values).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(settings.list().await.unwrap().is_empty());

        values.remove("Bad Key");
        values.insert("business_name".to_string(), "Chai Point".to_string());
        let written = settings.put_many(&values).await.unwrap();
        assert_eq!(written.len(), 2);

        let keys: Vec<String> = settings.list().await.unwrap().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["business_name", "currency_code"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        settings.put("receipt.footer", "Thank you").await.unwrap();
        assert!(settings.delete("receipt.footer").await.unwrap());
        assert!(!settings.delete("receipt.footer").await.unwrap());
    }
}
