//! # Product Repository
//!
//! Database operations for the product stock store.
//!
//! ## Stock Mutation Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Mutations Work                             │
//! │                                                                         │
//! │  Every quantity change flows through adjust_quantity() on an open      │
//! │  transaction, together with its ledger entry:                          │
//! │                                                                         │
//! │  1. UPDATE quantity = quantity + delta                                 │
//! │         ... AND quantity + delta >= 0     ← guard: never oversell      │
//! │  2. re-read the row                                                     │
//! │  3. UPDATE status = StockStatus::derive(quantity, threshold)           │
//! │                                                                         │
//! │  The guard makes concurrent decrements safe: SQLite's write lock       │
//! │  serializes the updates, and a decrement that would go negative        │
//! │  affects zero rows instead of losing an update.                        │
//! │                                                                         │
//! │  Status is computed in Rust (step 3), never in SQL - there is exactly  │
//! │  one implementation of the status rule in the workspace.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{Product, StockStatus};

/// Columns selected for every product read; keep in sync with the schema.
const PRODUCT_COLUMNS: &str = "id, tenant_id, code, name, category, price_cents, quantity, \
     unit, expiry_date, threshold, status, created_at, updated_at";

/// Repository for product database operations.
///
/// Reads go through the pool; writes that must commit together with a
/// ledger entry take an explicit connection from the caller's transaction.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its tenant-scoped business code.
    pub async fn get_by_code(&self, tenant_id: &str, code: &str) -> DbResult<Option<Product>> {
        Self::fetch_by_code(&self.pool, tenant_id, code).await
    }

    /// Same lookup on an arbitrary executor, so it can run inside an open
    /// transaction (e.g. the read-check-decrement step of a sale).
    pub async fn fetch_by_code<'e, E>(
        executor: E,
        tenant_id: &str,
        code: &str,
    ) -> DbResult<Option<Product>>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ? AND code = ?"
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    /// Lists a tenant's products, newest first, optionally filtered by a
    /// case-insensitive name search. Returns the page plus the total count
    /// of matching rows.
    pub async fn list(
        &self,
        tenant_id: &str,
        search: &str,
        page: u32,
        limit: u32,
    ) -> DbResult<(Vec<Product>, i64)> {
        let page = page.max(1);
        let offset = (page - 1) * limit;

        debug!(tenant_id = %tenant_id, search = %search, page = %page, "Listing products");

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE tenant_id = ? AND name LIKE '%' || ? || '%' COLLATE NOCASE",
        )
        .bind(tenant_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE tenant_id = ? AND name LIKE '%' || ? || '%' COLLATE NOCASE \
             ORDER BY created_at DESC \
             LIMIT ? OFFSET ?"
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(tenant_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((products, total))
    }

    /// Inserts a new product on an open transaction.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - (tenant_id, code) already exists
    pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, tenant_id = %product.tenant_id, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, tenant_id, code, name, category,
                price_cents, quantity, unit, expiry_date, threshold,
                status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.category)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(product.expiry_date)
        .bind(product.threshold)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Applies a guarded stock delta and recomputes the derived status, on
    /// an open transaction.
    ///
    /// Returns the updated product, or `None` when the guard rejected the
    /// update (unknown product, or a decrement past zero).
    pub async fn adjust_quantity(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        code: &str,
        delta: i64,
    ) -> DbResult<Option<Product>> {
        debug!(tenant_id = %tenant_id, code = %code, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products \
             SET quantity = quantity + ?, updated_at = ? \
             WHERE tenant_id = ? AND code = ? AND quantity + ? >= 0",
        )
        .bind(delta)
        .bind(now)
        .bind(tenant_id)
        .bind(code)
        .bind(delta)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        // Re-read and re-derive; the stored status must never drift from
        // the canonical fields within a committed transaction.
        let product = Self::fetch_by_code(&mut *conn, tenant_id, code)
            .await?
            .ok_or_else(|| DbError::not_found("Product", code))?;

        let status = StockStatus::derive(product.quantity, product.threshold);

        sqlx::query("UPDATE products SET status = ? WHERE id = ?")
            .bind(status)
            .bind(&product.id)
            .execute(&mut *conn)
            .await?;

        Ok(Some(Product { status, ..product }))
    }

    /// Re-derives the status of every stored product and rewrites rows that
    /// have drifted. Used by the periodic sweep; idempotent and safe to run
    /// concurrently with any other operation, since it only rewrites the
    /// derived field from the canonical ones.
    ///
    /// Returns the number of corrected rows.
    pub async fn resync_statuses(&self) -> DbResult<u64> {
        let rows: Vec<(String, i64, i64, StockStatus)> =
            sqlx::query_as("SELECT id, quantity, threshold, status FROM products")
                .fetch_all(&self.pool)
                .await?;

        let mut corrected = 0u64;
        let now = Utc::now();

        for (id, quantity, threshold, status) in rows {
            let expected = StockStatus::derive(quantity, threshold);
            if expected != status {
                sqlx::query("UPDATE products SET status = ?, updated_at = ? WHERE id = ?")
                    .bind(expected)
                    .bind(now)
                    .bind(&id)
                    .execute(&self.pool)
                    .await?;
                corrected += 1;
            }
        }

        Ok(corrected)
    }

    /// Counts a tenant's products (for diagnostics and the seed tool).
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
