//! # Stock Ledger Repository
//!
//! Database operations for the append-only transaction ledger.
//!
//! ## Append-Only Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ledger Lifecycle                                  │
//! │                                                                         │
//! │  record() ── INSERT ──► stock_transactions                             │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                    read accessors only                                  │
//! │                                                                         │
//! │  There is no UPDATE and no DELETE in this module, and no other module  │
//! │  touches the table. The ledger is the unit of truth for reporting:     │
//! │  for any product, Σ(PURCHASE qty) − Σ(SALE qty) over entries created   │
//! │  at or before T equals the product's quantity as of T.                 │
//! │                                                                         │
//! │  record() only ever runs on the same transaction as the stock          │
//! │  mutation it describes; if either write fails, neither commits.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{StockTransaction, TransactionType};

/// Columns selected for every ledger read; keep in sync with the schema.
const LEDGER_COLUMNS: &str =
    "id, tenant_id, product_id, quantity, amount_cents, tx_type, created_at";

/// Filter for ledger read accessors. All fields optional; `None` means
/// "don't restrict".
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Restrict to one entry type.
    pub tx_type: Option<TransactionType>,
    /// Entries created at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Entries created at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends one immutable ledger entry on an open transaction.
    pub async fn record(conn: &mut SqliteConnection, entry: &StockTransaction) -> DbResult<()> {
        debug!(
            tenant_id = %entry.tenant_id,
            product_id = %entry.product_id,
            tx_type = ?entry.tx_type,
            quantity = %entry.quantity,
            "Recording ledger entry"
        );

        sqlx::query(
            "INSERT INTO stock_transactions (
                id, tenant_id, product_id, quantity, amount_cents, tx_type, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.product_id)
        .bind(entry.quantity)
        .bind(entry.amount_cents)
        .bind(entry.tx_type)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reads a tenant's ledger entries, newest first, restricted by the
    /// filter. Raw sequences only; aggregation is the reader's concern.
    pub async fn list(&self, tenant_id: &str, filter: &LedgerFilter) -> DbResult<Vec<StockTransaction>> {
        let query = format!(
            "SELECT {LEDGER_COLUMNS} FROM stock_transactions \
             WHERE tenant_id = ? \
               AND (? IS NULL OR tx_type = ?) \
               AND (? IS NULL OR created_at >= ?) \
               AND (? IS NULL OR created_at <= ?) \
             ORDER BY created_at DESC"
        );

        let entries = sqlx::query_as::<_, StockTransaction>(&query)
            .bind(tenant_id)
            .bind(filter.tx_type)
            .bind(filter.tx_type)
            .bind(filter.from)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Net stock implied by a product's ledger history:
    /// Σ(PURCHASE quantities) − Σ(SALE quantities).
    ///
    /// Must always equal the product's current quantity; tests assert it.
    pub async fn net_quantity(&self, tenant_id: &str, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE tx_type WHEN 'SALE' THEN -quantity ELSE quantity END), 0) \
             FROM stock_transactions \
             WHERE tenant_id = ? AND product_id = ?",
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }
}

/// Generates a new ledger entry ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::{generate_product_id, ProductRepository};
    use tally_core::{Category, Product, StockStatus};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, tenant_id: &str, code: &str) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            tenant_id: tenant_id.to_string(),
            code: code.to_string(),
            name: code.to_string(),
            category: Category::Other,
            price_cents: 100,
            quantity: 50,
            unit: "pcs".to_string(),
            expiry_date: None,
            threshold: 5,
            status: StockStatus::derive(50, 5),
            created_at: now,
            updated_at: now,
        };
        let mut tx = db.begin().await.unwrap();
        ProductRepository::insert(&mut tx, &product).await.unwrap();
        tx.commit().await.unwrap();
        product
    }

    fn entry(product: &Product, quantity: i64, tx_type: TransactionType) -> StockTransaction {
        StockTransaction {
            id: generate_transaction_id(),
            tenant_id: product.tenant_id.clone(),
            product_id: product.id.clone(),
            quantity,
            amount_cents: quantity * product.price_cents,
            tx_type,
            created_at: Utc::now(),
        }
    }

    async fn record(db: &Database, e: &StockTransaction) {
        let mut tx = db.begin().await.unwrap();
        LedgerRepository::record(&mut tx, e).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_record_and_net_quantity() {
        let db = test_db().await;
        let product = seed_product(&db, "t1", "A-1").await;

        record(&db, &entry(&product, 50, TransactionType::Purchase)).await;
        record(&db, &entry(&product, 20, TransactionType::Sale)).await;
        record(&db, &entry(&product, 10, TransactionType::Sale)).await;

        let net = db.ledger().net_quantity("t1", &product.id).await.unwrap();
        assert_eq!(net, 20);
    }

    #[tokio::test]
    async fn test_list_filters_by_type() {
        let db = test_db().await;
        let product = seed_product(&db, "t1", "A-1").await;

        record(&db, &entry(&product, 50, TransactionType::Purchase)).await;
        record(&db, &entry(&product, 20, TransactionType::Sale)).await;

        let all = db.ledger().list("t1", &LedgerFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let sales = db
            .ledger()
            .list(
                "t1",
                &LedgerFilter {
                    tx_type: Some(TransactionType::Sale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 20);
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let db = test_db().await;
        let product = seed_product(&db, "t1", "A-1").await;
        record(&db, &entry(&product, 5, TransactionType::Purchase)).await;

        let other = db.ledger().list("t2", &LedgerFilter::default()).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_date_range() {
        let db = test_db().await;
        let product = seed_product(&db, "t1", "A-1").await;
        record(&db, &entry(&product, 5, TransactionType::Purchase)).await;

        let future_only = LedgerFilter {
            from: Some(Utc::now() + chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(db.ledger().list("t1", &future_only).await.unwrap().is_empty());

        let so_far = LedgerFilter {
            to: Some(Utc::now()),
            ..Default::default()
        };
        assert_eq!(db.ledger().list("t1", &so_far).await.unwrap().len(), 1);
    }
}
