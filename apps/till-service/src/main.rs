//! # Till Service Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load configuration (defaults → till.toml → TILL_* env)
//! 3. Connect to database & run migrations
//! 4. Serve JSON-lines requests from stdin until it closes
//! 5. Close the pool
//!
//! ```bash
//! echo '{"id":1,"command":"health"}' | till-service
//! ```

use anyhow::Context;
use tokio::io::{stdin, stdout, BufReader};
use tracing::info;

use till_service::{init_tracing, serve, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Till service");

    let config = ServiceConfig::load().context("loading configuration")?;
    info!(
        path = %config.database_path.display(),
        storage_timeout_ms = config.storage_timeout_ms,
        "Configuration loaded"
    );

    let state = AppState::open(&config)
        .await
        .context("opening database")?;

    serve(&state, BufReader::new(stdin()), stdout())
        .await
        .context("serving requests")?;

    state.db.close().await;
    info!("Till service stopped");
    Ok(())
}
