//! # Read Accessors
//!
//! Tenant-scoped, read-only views used by reporting collaborators. These
//! expose raw filtered sequences; derived aggregates (dashboards,
//! statistics) are computed outside the core from what these return.

use serde::Serialize;

use tally_core::validation::validate_search_query;
use tally_core::{Product, StockTransaction};
use tally_db::LedgerFilter;

use crate::error::{ServiceError, ServiceResult};
use crate::InventoryService;

// =============================================================================
// Pagination Envelope
// =============================================================================

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: i64,
    /// 1-based page number.
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assembles a page; `limit` must be non-zero (callers default it).
    pub(crate) fn build(items: Vec<T>, total: i64, page: u32, limit: u32) -> Page<T> {
        let total_pages = ((total.max(0) as u64).div_ceil(limit as u64)) as u32;
        Page {
            items,
            total,
            page,
            total_pages,
        }
    }
}

// =============================================================================
// Read Operations
// =============================================================================

impl InventoryService {
    /// Current stock snapshot of one product.
    ///
    /// ## Errors
    /// * `NotFound` - no such product for this tenant
    pub async fn current_stock(&self, tenant_id: &str, code: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_code(tenant_id, code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", code))
    }

    /// Lists a tenant's products, newest first, optionally filtered by a
    /// case-insensitive name search.
    pub async fn list_products(
        &self,
        tenant_id: &str,
        search: &str,
        page: u32,
        limit: u32,
    ) -> ServiceResult<Page<Product>> {
        let search = validate_search_query(search)?;
        let limit = if limit == 0 { 10 } else { limit };

        let (items, total) = self.db.products().list(tenant_id, &search, page, limit).await?;
        Ok(Page::build(items, total, page.max(1), limit))
    }

    /// Reads a tenant's ledger entries, newest first, restricted by type
    /// and/or created-at range. Raw sequence; never aggregated here.
    pub async fn ledger_entries(
        &self,
        tenant_id: &str,
        filter: &LedgerFilter,
    ) -> ServiceResult<Vec<StockTransaction>> {
        Ok(self.db.ledger().list(tenant_id, filter).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{service, spec, OTHER_TENANT, TENANT};
    use tally_core::TransactionType;

    #[tokio::test]
    async fn test_current_stock_is_tenant_scoped() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 5, 1)).await.unwrap();

        assert_eq!(svc.current_stock(TENANT, "A-1").await.unwrap().quantity, 5);
        assert!(matches!(
            svc.current_stock(OTHER_TENANT, "A-1").await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_products_pagination() {
        let svc = service().await;
        for i in 0..5 {
            svc.create_purchase(TENANT, spec(&format!("P-{i}"), 5, 1)).await.unwrap();
        }

        let page = svc.list_products(TENANT, "", 1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);

        let last = svc.list_products(TENANT, "", 3, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_entries_filter_by_type() {
        let svc = service().await;
        svc.create_purchase(TENANT, spec("A-1", 10, 1)).await.unwrap();
        svc.sell(TENANT, "A-1", 4).await.unwrap();

        let all = svc.ledger_entries(TENANT, &LedgerFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let purchases = svc
            .ledger_entries(
                TENANT,
                &LedgerFilter {
                    tx_type: Some(TransactionType::Purchase),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].quantity, 10);
    }

    #[test]
    fn test_page_build_rounds_up() {
        let page = Page::build(vec![1, 2, 3], 7, 1, 3);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::build(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
    }
}
