//! # Bulk Import
//!
//! Drives the core intake parser row by row through the purchase path.
//!
//! ## Failure Asymmetry (load-bearing)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Bulk Import Failure Handling                            │
//! │                                                                         │
//! │  STRUCTURAL (header unresolvable, empty mandatory field, bad number)   │
//! │      └── aborts: MissingColumn before any row; row errors stop the     │
//! │          REMAINING import. Rows already applied stay applied - each    │
//! │          row committed atomically, so the ledger is consistent.        │
//! │                                                                         │
//! │  APPLICATION (duplicate product code → Conflict)                       │
//! │      └── recorded in error_rows, batch continues. The ONLY             │
//! │          recoverable per-row failure class.                            │
//! │                                                                         │
//! │  INTERNAL (storage unavailable)                                        │
//! │      └── aborts the remaining rows; session consistency can no         │
//! │          longer be guaranteed.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{info, warn};

use tally_core::IntakeSheet;

use crate::error::ServiceResult;
use crate::InventoryService;

/// One tolerated row failure.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRowError {
    /// 1-based file row number (the header is row 1).
    pub row: usize,
    pub error: String,
}

/// Result of a bulk import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    /// Rows applied as purchases.
    pub success_count: usize,
    /// Rows that failed application (duplicate code conflicts only;
    /// structural errors abort the call instead of appearing here).
    pub error_rows: Vec<ImportRowError>,
}

impl InventoryService {
    /// Imports a tabular stock-intake file: one product + PURCHASE ledger
    /// entry per valid row, in file order.
    ///
    /// Unresolved categories default to `Other` (unlike single-item
    /// creation, which rejects them).
    ///
    /// ## Errors
    /// * `Validation` - empty file, unresolvable mandatory column, or a
    ///   structural row error (missing field / invalid numeric); the
    ///   remaining import is aborted
    /// * `Internal` - storage failure; remaining rows are aborted
    pub async fn import_bulk(&self, tenant_id: &str, raw: &str) -> ServiceResult<ImportOutcome> {
        let sheet = IntakeSheet::parse(raw)?;

        info!(tenant_id = %tenant_id, rows = sheet.len(), "Bulk intake started");

        let mut outcome = ImportOutcome::default();

        for row in sheet.rows() {
            let row = row?;
            let row_number = row.row;
            let category = row.category;

            match self
                .apply_new_product(tenant_id, row.into_spec(), category)
                .await
            {
                Ok(_) => outcome.success_count += 1,
                Err(err) if err.is_conflict() => {
                    warn!(row = row_number, error = %err, "Bulk intake row rejected");
                    outcome.error_rows.push(ImportRowError {
                        row: row_number,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            tenant_id = %tenant_id,
            success_count = outcome.success_count,
            error_rows = outcome.error_rows.len(),
            "Bulk intake finished"
        );

        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
