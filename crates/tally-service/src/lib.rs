//! # tally-service: Operation Orchestration for Tally Inventory
//!
//! Everything that changes stock goes through this crate, and every change
//! is durably recorded: a stock mutation and its ledger entry (and, for
//! sales, the invoice) commit in one database transaction.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Service Operations                               │
//! │                                                                         │
//! │  INTAKE (stock in)                    SALE (stock out)                 │
//! │  ─────────────────                    ────────────────                 │
//! │  create_purchase ──┐                  sell                             │
//! │  restock ──────────┤                   ├─ guard stock                  │
//! │  import_bulk ──────┤                   ├─ decrement + status           │
//! │         │          │                   ├─ SALE ledger entry            │
//! │         ▼          ▼                   ├─ allocate invoice number      │
//! │    product upsert + PURCHASE           └─ mint Invoice (Unpaid)        │
//! │    ledger entry, one txn each                                          │
//! │                                                                         │
//! │  READS                                MAINTENANCE                      │
//! │  ─────                                ───────────                      │
//! │  current_stock, list_products         StatusSweep (periodic,          │
//! │  ledger_entries, list_invoices        best-effort status re-derive)   │
//! │  get_invoice, mark_invoice_paid                                        │
//! │                                                                         │
//! │  Every operation takes an explicit tenant_id. No ambient identity.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod import;
pub mod invoice;
pub mod purchase;
pub mod query;
pub mod sale;
pub mod sweep;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ServiceError, ServiceResult};
pub use import::{ImportOutcome, ImportRowError};
pub use query::Page;
pub use sweep::{StatusSweep, StatusSweepHandle};

use tally_db::Database;

// =============================================================================
// Service Handle
// =============================================================================

/// The inventory service.
///
/// Cheap to clone; each operation acquires what it needs from the pool.
/// Operations are defined in the per-flow modules (`purchase`, `sale`,
/// `import`, `invoice`, `query`) as `impl InventoryService` blocks.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    /// Creates a service over an initialized database.
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Returns the underlying database handle (e.g. to spawn a
    /// [`StatusSweep`] against the same store).
    pub fn database(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// Shared Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tally_core::NewProduct;
    use tally_db::DbConfig;

    pub const TENANT: &str = "tenant-a";
    pub const OTHER_TENANT: &str = "tenant-b";

    /// Fresh service over an isolated in-memory database.
    pub async fn service() -> InventoryService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        InventoryService::new(db)
    }

    /// A valid new-product spec; tweak fields per test.
    pub fn spec(code: &str, quantity: i64, threshold: i64) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            name: format!("Product {code}"),
            category: "Grocery".to_string(),
            price_cents: 250,
            quantity,
            unit: "pcs".to_string(),
            expiry_date: None,
            threshold,
        }
    }
}
