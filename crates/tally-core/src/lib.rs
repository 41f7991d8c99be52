//! # tally-core: Pure Business Logic for Tally Inventory
//!
//! This crate is the **heart** of Tally Inventory. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tally Inventory Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Collaborators (external)                        │   │
//! │  │    HTTP layer ── file-upload handler ── reporting endpoints     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-service                                │   │
//! │  │    create_purchase, sell, import_bulk, mark_invoice_paid       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  intake   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  parser   │  │   rules   │  │   │
//! │  │   │  Invoice  │  │  (cents)  │  │  headers  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockTransaction, Invoice, enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Input validation error types
//! - [`validation`] - Business rule validation
//! - [`intake`] - Bulk stock-intake parser (header aliases, row checks)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::types::StockStatus;
//!
//! // Status is a pure function of (quantity, threshold); nothing else
//! // in the workspace is allowed to produce a status value.
//! assert_eq!(StockStatus::derive(0, 5), StockStatus::OutOfStock);
//! assert_eq!(StockStatus::derive(3, 5), StockStatus::LowStock);
//! assert_eq!(StockStatus::derive(9, 5), StockStatus::InStock);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod intake;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use error::ValidationError;
pub use intake::{IntakeError, IntakeRow, IntakeSheet};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First invoice number ever issued.
///
/// The sequencer hands out `INV-1001`, `INV-1002`, ... in allocation order;
/// the backing counter is seeded with `INVOICE_SEQUENCE_START - 1`.
pub const INVOICE_SEQUENCE_START: i64 = 1001;

/// Prefix for human-readable invoice numbers.
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Days until a freshly minted invoice is due.
pub const INVOICE_DUE_DAYS: i64 = 7;

/// Formats an invoice number from its sequence value.
///
/// ## Example
/// ```rust
/// assert_eq!(tally_core::format_invoice_number(1001), "INV-1001");
/// ```
pub fn format_invoice_number(sequence: i64) -> String {
    format!("{}-{}", INVOICE_NUMBER_PREFIX, sequence)
}
