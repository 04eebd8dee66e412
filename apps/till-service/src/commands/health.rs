//! # Health Command
//!
//! Reports whether storage answers within the storage timeout and how
//! many migrations are applied.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    /// `"ok"` or `"degraded"`
    pub status: &'static str,
    pub database: bool,
    pub migrations_total: usize,
    pub migrations_applied: usize,
    pub storage_timeout_ms: u64,
    pub uptime_secs: u64,
    pub version: &'static str,
}

pub async fn health(state: &AppState) -> ApiResult<HealthDto> {
    debug!("health command");

    let database = state.db.health_check().await;
    let (total, applied) = if database {
        match till_db::migrations::migration_status(state.db.pool()).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                (0, 0)
            }
        }
    } else {
        (0, 0)
    };

    let healthy = database && total > 0 && total == applied;

    Ok(HealthDto {
        status: if healthy { "ok" } else { "degraded" },
        database,
        migrations_total: total,
        migrations_applied: applied,
        storage_timeout_ms: state.db.storage_timeout().as_millis() as u64,
        uptime_secs: state.uptime_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_healthy_then_degraded_after_close() {
        let state = AppState::new(Database::new(DbConfig::in_memory()).await.unwrap());

        let report = health(&state).await.unwrap();
        assert_eq!(report.status, "ok");
        assert!(report.database);
        assert_eq!(report.migrations_total, report.migrations_applied);

        state.db.close().await;
        let report = health(&state).await.unwrap();
        assert_eq!(report.status, "degraded");
        assert!(!report.database);
    }
}
