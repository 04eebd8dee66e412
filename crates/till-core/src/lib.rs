//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the **heart** of the sales ledger. It contains the money
//! model, the tax engine and the receipt projection as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  till-service (command boundary)                │   │
//! │  │   create_product, record_sale, get_receipt, list_sales, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    tax    │  │  receipt  │  │   │
//! │  │   │  Product  │  │   Money   │  │compute_   │  │  Receipt  │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │   line    │  │ render_txt│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │       Catalog Store, Sales Ledger, Settings, Receipt lookup     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleReversal, Setting, ...)
//! - [`money`] - Money and TaxRate with integer arithmetic (no floating point!)
//! - [`tax`] - The tax engine: one sale line in, exact amounts out
//! - [`receipt`] - Receipt projection of a stored sale snapshot
//! - [`error`] - Domain error types and the stable error taxonomy
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::{Money, TaxRate};
//! use till_core::tax::compute_line;
//!
//! // Coffee at 100.00, three cups, 5% CGST + 5% SGST
//! let line = compute_line(
//!     Money::from_cents(10_000),
//!     3,
//!     TaxRate::from_bps(500),
//!     TaxRate::from_bps(500),
//! )
//! .unwrap();
//!
//! assert_eq!(line.subtotal.to_string(), "300.00");
//! assert_eq!(line.cgst.to_string(), "15.00");
//! assert_eq!(line.line_total.to_string(), "330.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod receipt;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, TaxRate};
pub use receipt::Receipt;
pub use tax::{compute_line, LineAmounts};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for a tax rate in basis points (100%).
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Settings key holding the business name printed by front-ends.
pub const SETTING_BUSINESS_NAME: &str = "business_name";

/// Settings key holding the ISO 4217 display currency.
pub const SETTING_CURRENCY_CODE: &str = "currency_code";
