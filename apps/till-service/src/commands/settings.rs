//! # Settings Commands
//!
//! Flat key/value business settings (`business_name`, `currency_code`, ...).
//! `put_settings` writes every pair in one transaction; concurrent writers
//! to the same key resolve last-write-wins.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

/// Settings as a key → value map.
pub type SettingsDto = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutSettingsArgs {
    pub values: BTreeMap<String, String>,
}

pub async fn get_settings(state: &AppState) -> ApiResult<SettingsDto> {
    debug!("get_settings command");

    let settings = state.db.settings().list().await?;
    Ok(settings.into_iter().map(|s| (s.key, s.value)).collect())
}

/// Upserts the given pairs and returns the full settings map.
pub async fn put_settings(state: &AppState, args: PutSettingsArgs) -> ApiResult<SettingsDto> {
    debug!(keys = args.values.len(), "put_settings command");

    state.db.settings().put_many(&args.values).await?;
    get_settings(state).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use till_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_put_then_get() {
        let state = AppState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        assert!(get_settings(&state).await.unwrap().is_empty());

        let mut values = BTreeMap::new();
        values.insert("business_name".to_string(), "Corner Café".to_string());
        values.insert("currency_code".to_string(), "INR".to_string());
        let all = put_settings(&state, PutSettingsArgs { values }).await.unwrap();
        assert_eq!(all["currency_code"], "INR");

        let mut values = BTreeMap::new();
        values.insert("currency_code".to_string(), "EUR".to_string());
        put_settings(&state, PutSettingsArgs { values }).await.unwrap();

        let all = get_settings(&state).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["currency_code"], "EUR");
    }

    #[tokio::test]
    async fn test_bad_key_writes_nothing() {
        let state = AppState::new(Database::new(DbConfig::in_memory()).await.unwrap());

        let mut values = BTreeMap::new();
        values.insert("business_name".to_string(), "Corner Café".to_string());
        values.insert("Not A Key!".to_string(), "x".to_string());
        let err = put_settings(&state, PutSettingsArgs { values }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        assert!(get_settings(&state).await.unwrap().is_empty());
    }
}
