//! Storage port for the commit coordinator.
//!
//! The coordinator codes against [`CheckoutStore`] only; adapters
//! implement it over whatever actually stores the data. [`crate::sqlite`]
//! adapts `caja_store::Store`, [`crate::memory`] keeps everything in a
//! mutex for tests and local development.
//!
//! Deletion methods are idempotent by contract: compensation may run
//! without knowing whether a timed-out write actually landed, so deleting
//! something that is not there must succeed.

use async_trait::async_trait;
use caja_core::{SaleHeader, SaleLine};
use thiserror::Error;

/// Opaque backend failure. The coordinator folds these into its own error
/// taxonomy; adapters put whatever detail they have into the message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError(message.into())
    }
}

/// Authoritative stock for one product at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: String,
    pub sku: String,
    pub stock: i64,
}

/// Result of one guarded stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The guard held; stock was decremented and units_sold incremented.
    Applied,
    /// The guard did not hold. `available` is the stock observed after
    /// the rejection; zero for missing or deactivated products.
    Insufficient { available: i64 },
}

/// What the commit coordinator needs from storage.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Current stock for the given products, restricted to active products
    /// of the branch. Products that are missing, inactive, or foreign to
    /// the branch are simply absent from the result.
    async fn stock_levels(
        &self,
        branch_id: &str,
        product_ids: &[String],
    ) -> Result<Vec<StockLevel>, BackendError>;

    /// Inserts the sale header.
    async fn insert_header(&self, header: &SaleHeader) -> Result<(), BackendError>;

    /// Inserts all sale lines as one atomic batch.
    async fn insert_lines(&self, lines: &[SaleLine]) -> Result<(), BackendError>;

    /// Applies the guarded decrement for one product:
    /// `stock -= quantity, units_sold += quantity` iff
    /// `active && stock >= quantity`. Reports the guard outcome; an `Err`
    /// means the backend itself failed.
    async fn apply_stock_decrement(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, BackendError>;

    /// Reverses an applied decrement: `stock += quantity,
    /// units_sold -= quantity`.
    async fn restore_stock(&self, product_id: &str, quantity: i64) -> Result<(), BackendError>;

    /// Deletes a sale's lines. Zero lines present is success.
    async fn delete_lines(&self, sale_id: &str) -> Result<(), BackendError>;

    /// Deletes a sale header. An absent header is success; a header that
    /// cannot be deleted (lines still reference it) is an error.
    async fn delete_header(&self, sale_id: &str) -> Result<(), BackendError>;

    /// Marks a sale voided. Fallback when `delete_header` is blocked.
    async fn void_header(&self, sale_id: &str) -> Result<(), BackendError>;
}
