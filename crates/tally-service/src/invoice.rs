//! # Invoice Operations
//!
//! Status transitions and reads over minted invoices. Invoices are created
//! only by [`InventoryService::sell`]; the single permitted mutation here
//! is Unpaid → Paid. Quantity and amount are frozen at mint time.

use tracing::info;

use tally_core::Invoice;

use crate::error::{ServiceError, ServiceResult};
use crate::query::Page;
use crate::InventoryService;

impl InventoryService {
    /// Marks an invoice Paid.
    ///
    /// Idempotent: marking an already-Paid invoice succeeds and leaves it
    /// Paid. (The alternative - rejecting the no-op transition - was not
    /// chosen; tests pin this behavior.)
    ///
    /// ## Errors
    /// * `NotFound` - no such invoice for this tenant
    pub async fn mark_invoice_paid(
        &self,
        tenant_id: &str,
        invoice_id: &str,
    ) -> ServiceResult<Invoice> {
        let invoice = self
            .db
            .invoices()
            .mark_paid(tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))?;

        info!(
            tenant_id = %tenant_id,
            invoice_number = %invoice.invoice_number,
            "Invoice marked paid"
        );

        Ok(invoice)
    }

    /// Gets one invoice, tenant-scoped.
    pub async fn get_invoice(&self, tenant_id: &str, invoice_id: &str) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get(tenant_id, invoice_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))
    }

    /// Lists a tenant's invoices, newest first, optionally filtered by an
    /// invoice-number search.
    pub async fn list_invoices(
        &self,
        tenant_id: &str,
        search: &str,
        page: u32,
        limit: u32,
    ) -> ServiceResult<Page<Invoice>> {
        let search = tally_core::validation::validate_search_query(search)?;
        let limit = if limit == 0 { 10 } else { limit };

        let (items, total) = self.db.invoices().list(tenant_id, &search, page, limit).await?;
        Ok(Page::build(items, total, page.max(1), limit))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
