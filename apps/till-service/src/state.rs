//! # Application State
//!
//! Everything a command handler needs, built once at startup and shared
//! by reference. The database handle is reference counted internally, so
//! `AppState` is cheap to clone into spawned tasks.

use std::time::Instant;

use tracing::info;

use crate::config::ServiceConfig;
use till_db::{Database, DbResult};

/// Shared service state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    started_at: Instant,
}

impl AppState {
    /// Wraps an already opened database.
    pub fn new(db: Database) -> Self {
        AppState {
            db,
            started_at: Instant::now(),
        }
    }

    /// Opens the database described by `config` and runs migrations.
    pub async fn open(config: &ServiceConfig) -> DbResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| till_db::DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path.display(), "Database connected and migrations applied");

        Ok(Self::new(db))
    }

    /// Seconds since the state was built.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
