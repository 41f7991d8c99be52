//! # Sale Operation
//!
//! The stock-out flow. One call performs, as one logical unit: stock
//! guard, decrement + status recompute, SALE ledger entry, invoice number
//! allocation, invoice mint.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sell(tenant, code, quantity)                                           │
//! │                                                                         │
//! │  validate quantity > 0          ── Validation, nothing touched         │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  fetch product (tenant-scoped)  ── NotFound, rollback (read-only)      │
//! │  check quantity <= stock        ── InsufficientStock, rollback         │
//! │  guarded decrement + status                                             │
//! │  SALE ledger entry (qty × current unit price)                          │
//! │  allocate invoice number (sequence row, serialized by write lock)      │
//! │  insert Invoice (Unpaid, due now + 7 days)                             │
//! │       │  COMMIT                                                         │
//! │       ▼                                                                 │
//! │  Invoice                                                                │
//! │                                                                         │
//! │  Any failure before COMMIT rolls the whole unit back: there is no      │
//! │  state where the stock moved but the ledger or invoice did not.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use tracing::info;

use tally_core::validation::validate_quantity;
use tally_core::{
    Invoice, InvoiceStatus, StockTransaction, TransactionType, INVOICE_DUE_DAYS,
};
use tally_db::repository::invoice::generate_invoice_id;
use tally_db::repository::ledger::generate_transaction_id;
use tally_db::{DbError, InvoiceRepository, LedgerRepository, ProductRepository};

use crate::error::{ServiceError, ServiceResult};
use crate::InventoryService;

impl InventoryService {
    /// Sells `quantity` units of the tenant's product `code`, returning the
    /// minted invoice.
    ///
    /// ## Errors
    /// * `Validation` - quantity <= 0
    /// * `NotFound` - no such product for this tenant
    /// * `InsufficientStock` - requested quantity exceeds current stock
    ///
    /// A failed sale mutates nothing: no stock change, no ledger entry, no
    /// invoice, no consumed invoice number.
    pub async fn sell(
        &self,
        tenant_id: &str,
        code: &str,
        quantity: i64,
    ) -> ServiceResult<Invoice> {
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;

        let product = ProductRepository::fetch_by_code(&mut *tx, tenant_id, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", code))?;

        if !product.can_fill(quantity) {
            return Err(ServiceError::InsufficientStock {
                code: code.to_string(),
                available: product.quantity,
                requested: quantity,
            });
        }

        // The guard re-checks under the write lock; a concurrent sale that
        // drained the stock between our read and this update surfaces here
        // instead of losing the update.
        let updated = ProductRepository::adjust_quantity(&mut tx, tenant_id, code, -quantity)
            .await?
            .ok_or_else(|| ServiceError::InsufficientStock {
                code: code.to_string(),
                available: product.quantity,
                requested: quantity,
            })?;

        let amount = product
            .price()
            .line_total(quantity)
            .ok_or_else(|| ServiceError::validation("amount overflows"))?;

        let now = Utc::now();

        let entry = StockTransaction {
            id: generate_transaction_id(),
            tenant_id: tenant_id.to_string(),
            product_id: product.id.clone(),
            quantity,
            amount_cents: amount.cents(),
            tx_type: TransactionType::Sale,
            created_at: now,
        };
        LedgerRepository::record(&mut tx, &entry).await?;

        let invoice_number = InvoiceRepository::next_invoice_number(&mut tx).await?;

        let invoice = Invoice {
            id: generate_invoice_id(),
            tenant_id: tenant_id.to_string(),
            invoice_number,
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            amount_cents: amount.cents(),
            status: InvoiceStatus::Unpaid,
            due_date: now + Duration::days(INVOICE_DUE_DAYS),
            created_at: now,
            updated_at: now,
        };
        InvoiceRepository::insert(&mut tx, &invoice).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            code = %code,
            quantity = %quantity,
            invoice_number = %invoice.invoice_number,
            remaining_stock = %updated.quantity,
            "Sale completed"
        );

        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{service, spec, OTHER_TENANT, TENANT};
    use tally_core::StockStatus;
    use tally_db::LedgerFilter;

    #[tokio::test]
    async fn test_sell_decrements_records_and_mints_invoice() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("COKE-330", 48, 12)).await.unwrap();

        let invoice = svc.sell(TENANT, "COKE-330", 8).await.unwrap();

        assert_eq!(invoice.invoice_number, "INV-1001");
        assert_eq!(invoice.quantity, 8);
        assert_eq!(invoice.unit_price_cents, 250);
        assert_eq!(invoice.amount_cents, 8 * 250);
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.due_date - invoice.created_at, Duration::days(7));

        let product = svc.current_stock(TENANT, "COKE-330").await.unwrap();
        assert_eq!(product.quantity, 40);

        // Exactly one SALE ledger entry with the same amount
        let sales = svc
            .database()
            .ledger()
            .list(
                TENANT,
                &LedgerFilter {
                    tx_type: Some(TransactionType::Sale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].amount_cents, invoice.amount_cents);
    }

    #[tokio::test]
    async fn test_invoice_numbers_strictly_increase() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 100, 2)).await.unwrap();

        let mut numbers = Vec::new();
        for _ in 0..3 {
            numbers.push(svc.sell(TENANT, "A-1", 1).await.unwrap().invoice_number);
        }

        assert_eq!(numbers, vec!["INV-1001", "INV-1002", "INV-1003"]);
    }

    #[tokio::test]
    async fn test_sequence_is_global_across_tenants() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 10, 1)).await.unwrap();
        svc.create_purchase(OTHER_TENANT, spec("B-1", 10, 1)).await.unwrap();

        let first = svc.sell(TENANT, "A-1", 1).await.unwrap();
        let second = svc.sell(OTHER_TENANT, "B-1", 1).await.unwrap();

        assert_eq!(first.invoice_number, "INV-1001");
        assert_eq!(second.invoice_number, "INV-1002");
    }

    #[tokio::test]
    async fn test_oversell_mutates_nothing() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 5, 1)).await.unwrap();

        let err = svc.sell(TENANT, "A-1", 6).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        // Stock unchanged, no SALE entry, no invoice, no consumed number
        let product = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(product.quantity, 5);

        let sales = svc
            .database()
            .ledger()
            .list(
                TENANT,
                &LedgerFilter {
                    tx_type: Some(TransactionType::Sale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(sales.is_empty());

        let (invoices, total) = svc.database().invoices().list(TENANT, "", 1, 10).await.unwrap();
        assert!(invoices.is_empty());
        assert_eq!(total, 0);

        // Next successful sale still gets the first number
        let invoice = svc.sell(TENANT, "A-1", 1).await.unwrap();
        assert_eq!(invoice.invoice_number, "INV-1001");
    }

    #[tokio::test]
    async fn test_sell_unknown_product_is_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.sell(TENANT, "NOPE", 1).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_sell_rejects_non_positive_quantity() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 5, 1)).await.unwrap();

        assert!(matches!(
            svc.sell(TENANT, "A-1", 0).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            svc.sell(TENANT, "A-1", -2).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_sell_is_tenant_scoped() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 5, 1)).await.unwrap();

        // Another tenant cannot sell this product
        assert!(matches!(
            svc.sell(OTHER_TENANT, "A-1", 1).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_selling_out_updates_status() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 6, 4)).await.unwrap();

        svc.sell(TENANT, "A-1", 3).await.unwrap();
        let product = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(product.status, StockStatus::LowStock);

        svc.sell(TENANT, "A-1", 3).await.unwrap();
        let product = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(product.status, StockStatus::OutOfStock);
        assert_eq!(product.quantity, 0);
    }

    #[tokio::test]
    async fn test_ledger_net_matches_stock_over_sequence() {
        let svc = service().await;
        let product = svc.create_purchase(TENANT, spec("A-1", 50, 5)).await.unwrap();

        svc.sell(TENANT, "A-1", 20).await.unwrap();
        svc.restock(TENANT, "A-1", 30).await.unwrap();
        svc.sell(TENANT, "A-1", 10).await.unwrap();

        let current = svc.current_stock(TENANT, "A-1").await.unwrap();
        assert_eq!(current.quantity, 50);

        let net = svc
            .database()
            .ledger()
            .net_quantity(TENANT, &product.id)
            .await
            .unwrap();
        assert_eq!(net, current.quantity);
        assert_eq!(current.status, StockStatus::derive(current.quantity, current.threshold));
    }
}
