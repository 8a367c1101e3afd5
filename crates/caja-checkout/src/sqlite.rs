//! [`CheckoutStore`] adapter over [`caja_store::Store`].
//!
//! Thin delegation: each port method maps onto one repository call and
//! store errors collapse into [`BackendError`] messages. The one piece of
//! logic is in `apply_stock_decrement`, where a rejected guard is followed
//! by a re-read so the caller learns how much stock actually remains.

use async_trait::async_trait;
use caja_core::{SaleHeader, SaleLine};
use caja_store::{Store, StoreError};

use crate::port::{BackendError, CheckoutStore, DecrementOutcome, StockLevel};

fn backend(err: StoreError) -> BackendError {
    BackendError::new(err.to_string())
}

#[async_trait]
impl CheckoutStore for Store {
    async fn stock_levels(
        &self,
        branch_id: &str,
        product_ids: &[String],
    ) -> Result<Vec<StockLevel>, BackendError> {
        // One lookup per product. Carts are bounded, so this stays small.
        let products = self.products();
        let mut levels = Vec::with_capacity(product_ids.len());
        for id in product_ids {
            if let Some(product) = products.get_by_id(id).await.map_err(backend)? {
                if product.is_active && product.branch_id == branch_id {
                    levels.push(StockLevel {
                        product_id: product.id,
                        sku: product.sku,
                        stock: product.stock,
                    });
                }
            }
        }
        Ok(levels)
    }

    async fn insert_header(&self, header: &SaleHeader) -> Result<(), BackendError> {
        self.sales().insert_header(header).await.map_err(backend)
    }

    async fn insert_lines(&self, lines: &[SaleLine]) -> Result<(), BackendError> {
        self.sales().insert_lines(lines).await.map_err(backend)
    }

    async fn apply_stock_decrement(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, BackendError> {
        let products = self.products();
        if products
            .decrement_or_reject(product_id, quantity)
            .await
            .map_err(backend)?
        {
            return Ok(DecrementOutcome::Applied);
        }
        let available = match products.get_by_id(product_id).await.map_err(backend)? {
            Some(product) if product.is_active => product.stock,
            _ => 0,
        };
        Ok(DecrementOutcome::Insufficient { available })
    }

    async fn restore_stock(&self, product_id: &str, quantity: i64) -> Result<(), BackendError> {
        self.products()
            .restore_stock(product_id, quantity)
            .await
            .map_err(backend)
    }

    async fn delete_lines(&self, sale_id: &str) -> Result<(), BackendError> {
        self.sales()
            .delete_lines(sale_id)
            .await
            .map(|_| ())
            .map_err(backend)
    }

    async fn delete_header(&self, sale_id: &str) -> Result<(), BackendError> {
        match self.sales().delete_header(sale_id).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted.
            Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(backend(e)),
        }
    }

    async fn void_header(&self, sale_id: &str) -> Result<(), BackendError> {
        self.sales().void_header(sale_id).await.map_err(backend)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
