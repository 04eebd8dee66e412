//! # Till Service Library
//!
//! Command boundary for the Till POS sales ledger.
//!
//! ## Module Organization
//! ```text
//! till_service/
//! ├── lib.rs          ◄─── You are here (tracing setup, re-exports)
//! ├── config.rs       ◄─── ServiceConfig (defaults → till.toml → TILL_*)
//! ├── state.rs        ◄─── AppState (Database handle)
//! ├── dispatch.rs     ◄─── JSON-lines request/response loop
//! ├── commands/
//! │   ├── product.rs  ◄─── Catalog commands
//! │   ├── sale.rs     ◄─── Ledger, summary and receipt commands
//! │   ├── settings.rs ◄─── Settings commands
//! │   └── health.rs   ◄─── Health report
//! └── error.rs        ◄─── ApiError (code, status, message, retryable)
//! ```

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod state;

use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, ServiceConfig};
pub use dispatch::{dispatch, handle_line, serve, Request, Response};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,till=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries protocol responses only.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_db=trace` - Show trace for the database crate only
/// - Default: [`DEFAULT_LOG_FILTER`]
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
