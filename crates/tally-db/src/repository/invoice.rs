//! # Invoice Repository
//!
//! Database operations for invoices and the invoice number sequence.
//!
//! ## Sequence Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Invoice Number Allocation                              │
//! │                                                                         │
//! │  ❌ RACY: read the latest invoice, parse its number, add one.          │
//! │     Two concurrent sales read the same "latest" and mint duplicates.   │
//! │                                                                         │
//! │  ✅ SERIALIZED: a dedicated one-row counter, bumped in the sale's      │
//! │     transaction:                                                        │
//! │                                                                         │
//! │     UPDATE invoice_sequence SET last_value = last_value + 1            │
//! │     WHERE id = 1 RETURNING last_value                                  │
//! │                                                                         │
//! │     SQLite's write lock serializes the bump with the rest of the       │
//! │     sale; a rolled-back sale releases its number (gaps are fine,       │
//! │     duplicates are not). The UNIQUE index on invoice_number stays      │
//! │     as a backstop.                                                      │
//! │                                                                         │
//! │  Numbers are global across tenants: INV-1001, INV-1002, ...            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{format_invoice_number, Invoice, InvoiceStatus};

/// Columns selected for every invoice read; keep in sync with the schema.
const INVOICE_COLUMNS: &str = "id, tenant_id, invoice_number, product_id, quantity, \
     unit_price_cents, amount_cents, status, due_date, created_at, updated_at";

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Allocates the next invoice number on an open transaction.
    ///
    /// Strictly increasing across the whole system; first allocation ever
    /// yields `INV-1001`.
    pub async fn next_invoice_number(conn: &mut SqliteConnection) -> DbResult<String> {
        let value: i64 = sqlx::query_scalar(
            "UPDATE invoice_sequence SET last_value = last_value + 1 \
             WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *conn)
        .await?;

        debug!(value = %value, "Allocated invoice sequence value");
        Ok(format_invoice_number(value))
    }

    /// Inserts an invoice on an open transaction (the same one that wrote
    /// the SALE ledger entry).
    pub async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
        debug!(
            invoice_number = %invoice.invoice_number,
            tenant_id = %invoice.tenant_id,
            "Inserting invoice"
        );

        sqlx::query(
            "INSERT INTO invoices (
                id, tenant_id, invoice_number, product_id, quantity,
                unit_price_cents, amount_cents, status, due_date,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&invoice.id)
        .bind(&invoice.tenant_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.product_id)
        .bind(invoice.quantity)
        .bind(invoice.unit_price_cents)
        .bind(invoice.amount_cents)
        .bind(invoice.status)
        .bind(invoice.due_date)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets an invoice by ID, tenant-scoped.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE tenant_id = ? AND id = ?"
        );

        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Marks an invoice Paid.
    ///
    /// Idempotent: no status guard in the WHERE clause, so marking a Paid
    /// invoice again succeeds and leaves it Paid. Returns the updated
    /// invoice, or `None` when the tenant has no such invoice.
    pub async fn mark_paid(&self, tenant_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        debug!(tenant_id = %tenant_id, id = %id, "Marking invoice paid");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE invoices SET status = ?, updated_at = ? WHERE tenant_id = ? AND id = ?",
        )
        .bind(InvoiceStatus::Paid)
        .bind(now)
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(tenant_id, id).await
    }

    /// Lists a tenant's invoices, newest first, optionally filtered by an
    /// invoice-number search. Returns the page plus the total count of
    /// matching rows.
    pub async fn list(
        &self,
        tenant_id: &str,
        search: &str,
        page: u32,
        limit: u32,
    ) -> DbResult<(Vec<Invoice>, i64)> {
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices \
             WHERE tenant_id = ? AND invoice_number LIKE '%' || ? || '%' COLLATE NOCASE",
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE tenant_id = ? AND invoice_number LIKE '%' || ? || '%' COLLATE NOCASE \
             ORDER BY created_at DESC \
             LIMIT ? OFFSET ?"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&query)
            .bind(tenant_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((invoices, total))
    }
}

/// Generates a new invoice ID.
pub fn generate_invoice_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Products exist independently in these tests; FK enforcement is
    /// exercised in the service-level flows.
    async fn seed_product_row(db: &Database, tenant_id: &str, id: &str) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO products (id, tenant_id, code, name, category, price_cents, \
             quantity, unit, expiry_date, threshold, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 'Other', 100, 10, 'pcs', NULL, 1, 'In Stock', ?, ?)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(id)
        .bind(id)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    fn invoice(tenant_id: &str, number: &str, product_id: &str) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: generate_invoice_id(),
            tenant_id: tenant_id.to_string(),
            invoice_number: number.to_string(),
            product_id: product_id.to_string(),
            quantity: 2,
            unit_price_cents: 100,
            amount_cents: 200,
            status: InvoiceStatus::Unpaid,
            due_date: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_sequence_starts_at_1001_and_increases() {
        let db = test_db().await;

        let mut tx = db.begin().await.unwrap();
        let first = InvoiceRepository::next_invoice_number(&mut tx).await.unwrap();
        let second = InvoiceRepository::next_invoice_number(&mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, "INV-1001");
        assert_eq!(second, "INV-1002");
    }

    #[tokio::test]
    async fn test_rolled_back_allocation_is_released() {
        let db = test_db().await;

        let mut tx = db.begin().await.unwrap();
        let number = InvoiceRepository::next_invoice_number(&mut tx).await.unwrap();
        assert_eq!(number, "INV-1001");
        tx.rollback().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let number = InvoiceRepository::next_invoice_number(&mut tx).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(number, "INV-1001");
    }

    #[tokio::test]
    async fn test_insert_get_and_tenant_scope() {
        let db = test_db().await;
        seed_product_row(&db, "t1", "p1").await;

        let inv = invoice("t1", "INV-1001", "p1");
        let mut tx = db.begin().await.unwrap();
        InvoiceRepository::insert(&mut tx, &inv).await.unwrap();
        tx.commit().await.unwrap();

        let found = db.invoices().get("t1", &inv.id).await.unwrap();
        assert_eq!(found.unwrap().invoice_number, "INV-1001");

        assert!(db.invoices().get("t2", &inv.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let db = test_db().await;
        seed_product_row(&db, "t1", "p1").await;

        let inv = invoice("t1", "INV-1001", "p1");
        let mut tx = db.begin().await.unwrap();
        InvoiceRepository::insert(&mut tx, &inv).await.unwrap();
        tx.commit().await.unwrap();

        let paid = db.invoices().mark_paid("t1", &inv.id).await.unwrap().unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);

        // Second call succeeds and the state is unchanged
        let paid_again = db.invoices().mark_paid("t1", &inv.id).await.unwrap().unwrap();
        assert_eq!(paid_again.status, InvoiceStatus::Paid);

        // Unknown invoice (or wrong tenant) is None
        assert!(db.invoices().mark_paid("t2", &inv.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_searches_by_number() {
        let db = test_db().await;
        seed_product_row(&db, "t1", "p1").await;

        for n in 1001..1004 {
            let inv = invoice("t1", &format_invoice_number(n), "p1");
            let mut tx = db.begin().await.unwrap();
            InvoiceRepository::insert(&mut tx, &inv).await.unwrap();
            tx.commit().await.unwrap();
        }

        let (all, total) = db.invoices().list("t1", "", 1, 10).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let (hits, total) = db.invoices().list("t1", "1002", 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(hits[0].invoice_number, "INV-1002");
    }
}
