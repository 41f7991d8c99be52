//! # Purchase Intake
//!
//! Stock-in flows: first-creation purchase and restock of an existing
//! product. Both terminate in the same shape - a product write plus a
//! PURCHASE ledger entry in one transaction - which is also where bulk
//! import rows land (see `import`).
//!
//! ## Category Policy
//! This path *rejects* unknown categories. Bulk intake instead defaults
//! them to `Other`. The asymmetry is intentional and preserved; do not
//! unify without a policy decision.

use chrono::Utc;
use tracing::info;

use tally_core::validation::{validate_new_product, validate_quantity};
use tally_core::{Category, Money, NewProduct, Product, StockStatus, StockTransaction, TransactionType};
use tally_db::repository::ledger::generate_transaction_id;
use tally_db::repository::product::generate_product_id;
use tally_db::{DbError, LedgerRepository, ProductRepository};

use crate::error::{ServiceError, ServiceResult};
use crate::InventoryService;

impl InventoryService {
    /// Creates a product from its first purchase intake.
    ///
    /// Validates the spec, resolves the category strictly, then atomically
    /// inserts the product and its opening PURCHASE ledger entry.
    ///
    /// ## Errors
    /// * `Validation` - bad field values or an unknown category
    /// * `Conflict` - the tenant already has a product with this code
    pub async fn create_purchase(
        &self,
        tenant_id: &str,
        spec: NewProduct,
    ) -> ServiceResult<Product> {
        validate_new_product(&spec)?;

        let category = Category::resolve(&spec.category).ok_or_else(|| {
            let allowed: Vec<&str> = Category::ALL.iter().map(Category::label).collect();
            ServiceError::validation(format!(
                "category must be one of: {}",
                allowed.join(", ")
            ))
        })?;

        self.apply_new_product(tenant_id, spec, category).await
    }

    /// Purchases more stock of an existing product.
    ///
    /// The symmetric path to [`InventoryService::sell`]: guarded increment,
    /// status recompute, PURCHASE ledger entry at the current unit price,
    /// one transaction.
    ///
    /// ## Errors
    /// * `Validation` - quantity <= 0
    /// * `NotFound` - no such product for this tenant
    pub async fn restock(
        &self,
        tenant_id: &str,
        code: &str,
        quantity: i64,
    ) -> ServiceResult<Product> {
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;

        let product = ProductRepository::fetch_by_code(&mut *tx, tenant_id, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", code))?;

        let updated = ProductRepository::adjust_quantity(&mut tx, tenant_id, code, quantity)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("concurrent stock update on {code}"))
            })?;

        let amount = Money::from_cents(product.price_cents)
            .line_total(quantity)
            .ok_or_else(|| ServiceError::validation("amount overflows"))?;

        let entry = StockTransaction {
            id: generate_transaction_id(),
            tenant_id: tenant_id.to_string(),
            product_id: product.id.clone(),
            quantity,
            amount_cents: amount.cents(),
            tx_type: TransactionType::Purchase,
            created_at: Utc::now(),
        };
        LedgerRepository::record(&mut tx, &entry).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            code = %code,
            quantity = %quantity,
            new_stock = %updated.quantity,
            "Restock applied"
        );

        Ok(updated)
    }

    /// Inserts a product with an already-resolved category plus its opening
    /// PURCHASE ledger entry, atomically. Shared by [`create_purchase`] and
    /// the bulk-import row path, which differ only in validation and
    /// category policy upstream of this point.
    ///
    /// [`create_purchase`]: InventoryService::create_purchase
    pub(crate) async fn apply_new_product(
        &self,
        tenant_id: &str,
        spec: NewProduct,
        category: Category,
    ) -> ServiceResult<Product> {
        let now = Utc::now();

        let product = Product {
            id: generate_product_id(),
            tenant_id: tenant_id.to_string(),
            code: spec.code.trim().to_string(),
            name: spec.name.trim().to_string(),
            category,
            price_cents: spec.price_cents,
            quantity: spec.quantity,
            unit: spec.unit.trim().to_string(),
            expiry_date: spec.expiry_date,
            threshold: spec.threshold,
            status: StockStatus::derive(spec.quantity, spec.threshold),
            created_at: now,
            updated_at: now,
        };

        let amount = Money::from_cents(spec.price_cents)
            .line_total(spec.quantity)
            .ok_or_else(|| ServiceError::validation("amount overflows"))?;

        let entry = StockTransaction {
            id: generate_transaction_id(),
            tenant_id: tenant_id.to_string(),
            product_id: product.id.clone(),
            quantity: spec.quantity,
            amount_cents: amount.cents(),
            tx_type: TransactionType::Purchase,
            created_at: now,
        };

        let mut tx = self.db.begin().await?;
        ProductRepository::insert(&mut tx, &product).await?;
        LedgerRepository::record(&mut tx, &entry).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            code = %product.code,
            quantity = %product.quantity,
            status = %product.status,
            "Purchase intake applied"
        );

        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{service, spec, TENANT};
    use tally_db::LedgerFilter;

    #[tokio::test]
    async fn test_create_purchase_writes_product_and_ledger() {
        let svc = service().await;

        let product = svc.create_purchase(TENANT, spec("COKE-330", 48, 12)).await.unwrap();
        assert_eq!(product.quantity, 48);
        assert_eq!(product.status, StockStatus::InStock);

        // Exactly one PURCHASE ledger entry, amount = qty × price
        let entries = svc
            .database()
            .ledger()
            .list(TENANT, &LedgerFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tx_type, TransactionType::Purchase);
        assert_eq!(entries[0].quantity, 48);
        assert_eq!(entries[0].amount_cents, 48 * 250);
    }

    #[tokio::test]
    async fn test_create_purchase_rejects_unknown_category() {
        let svc = service().await;

        let mut bad = spec("A-1", 5, 1);
        bad.category = "Gadgets".to_string();

        let err = svc.create_purchase(TENANT, bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.to_string().contains("category must be one of"));

        // Nothing written
        assert!(svc
            .database()
            .products()
            .get_by_code(TENANT, "A-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_purchase_rejects_bad_quantity() {
        let svc = service().await;

        let mut bad = spec("A-1", 0, 1);
        bad.quantity = 0;
        assert!(matches!(
            svc.create_purchase(TENANT, bad).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 5, 1)).await.unwrap();

        let err = svc.create_purchase(TENANT, spec("A-1", 9, 1)).await.unwrap_err();
        assert!(err.is_conflict());

        // First product untouched
        let p = svc
            .database()
            .products()
            .get_by_code(TENANT, "A-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.quantity, 5);
    }

    #[tokio::test]
    async fn test_restock_increments_and_records() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 3, 5)).await.unwrap();

        let updated = svc.restock(TENANT, "A-1", 7).await.unwrap();
        assert_eq!(updated.quantity, 10);
        assert_eq!(updated.status, StockStatus::InStock);

        let entries = svc
            .database()
            .ledger()
            .list(TENANT, &LedgerFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);

        // Ledger net equals current stock
        let net = svc
            .database()
            .ledger()
            .net_quantity(TENANT, &updated.id)
            .await
            .unwrap();
        assert_eq!(net, updated.quantity);
    }

    #[tokio::test]
    async fn test_restock_unknown_product_is_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.restock(TENANT, "NOPE", 3).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
