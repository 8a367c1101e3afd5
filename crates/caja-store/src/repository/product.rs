//! # Product Repository
//!
//! Catalog queries and the stock movements every other flow relies on.
//!
//! ## Stock movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive_stock(id, qty)      stock += qty          (purchase received)  │
//! │  adjust_stock(id, stock)     stock = value         (manual correction)  │
//! │  decrement_or_reject(id, q)  stock -= q GUARDED    (sale commit)        │
//! │  restore_stock(id, q)        stock += q            (compensation)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement is the authoritative stock check for a sale:
//!
//! ```sql
//! UPDATE products
//! SET stock = stock - ?, units_sold = units_sold + ?
//! WHERE id = ? AND is_active = 1 AND stock >= ?
//! ```
//!
//! When two terminals race for the last units, SQLite serializes the two
//! UPDATEs; the loser's guard no longer holds, zero rows are affected, and
//! the caller learns it lost without stock ever going negative.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use caja_core::Product;

const PRODUCT_COLUMNS: &str = "id, branch_id, sku, name, brand, category, cost_cents, \
     price_cents, stock, low_stock_threshold, units_sold, is_active, created_at, updated_at";

/// Repository for catalog and stock operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = store.products();
/// let snapshot = repo.snapshot("branch-1").await?;
/// let hits = repo.search("branch-1", "arroz", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // ===== Reads =====

    /// Loads the full active catalog for a branch, ordered by name.
    ///
    /// This is the snapshot the POS screen works from. It is a plain read;
    /// the stock figures in it are advisory and may be stale by the time a
    /// sale commits.
    pub async fn snapshot(&self, branch_id: &str) -> StoreResult<Vec<Product>> {
        debug!(branch_id = %branch_id, "Loading catalog snapshot");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE branch_id = ?1 AND is_active = 1 \
             ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(branch_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Snapshot loaded");
        Ok(products)
    }

    /// Searches active products by name or SKU contains-match.
    ///
    /// An empty query returns the first `limit` products by name, which is
    /// what the POS search box shows before the cashier types anything.
    pub async fn search(&self, branch_id: &str, query: &str, limit: u32) -> StoreResult<Vec<Product>> {
        let query = query.trim();
        debug!(branch_id = %branch_id, query = %query, limit = %limit, "Searching products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE branch_id = ?1 AND is_active = 1 \
             AND (name LIKE ?2 OR sku LIKE ?2) \
             ORDER BY name \
             LIMIT ?3"
        );
        let pattern = if query.is_empty() {
            "%".to_string()
        } else {
            format!("%{query}%")
        };
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(branch_id)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Fetches a product by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Fetches a product by SKU within a branch, active or not.
    pub async fn get_by_sku(&self, branch_id: &str, sku: &str) -> StoreResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE branch_id = ?1 AND sku = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(branch_id)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Active products at or below their low-stock threshold, lowest first.
    pub async fn list_low_stock(&self, branch_id: &str) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE branch_id = ?1 AND is_active = 1 AND stock <= low_stock_threshold \
             ORDER BY stock ASC, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(branch_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Counts active products in a branch.
    pub async fn count(&self, branch_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE branch_id = ?1 AND is_active = 1",
        )
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // ===== Writes =====

    /// Inserts a new product. Fails with [`StoreError::UniqueViolation`] on
    /// a duplicate SKU within the branch.
    pub async fn insert(&self, product: &Product) -> StoreResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            "INSERT INTO products (id, branch_id, sku, name, brand, category, cost_cents, \
             price_cents, stock, low_stock_threshold, units_sold, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&product.id)
        .bind(&product.branch_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.cost_cents)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.units_sold)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalog fields. Stock is deliberately not
    /// touched here; all stock movements go through the dedicated methods.
    pub async fn update(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET \
             sku = ?2, name = ?3, brand = ?4, category = ?5, cost_cents = ?6, \
             price_cents = ?7, low_stock_threshold = ?8, updated_at = ?9 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.cost_cents)
        .bind(product.price_cents)
        .bind(product.low_stock_threshold)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Sets stock to an absolute value (physical count correction).
    pub async fn adjust_stock(&self, id: &str, new_stock: i64) -> StoreResult<()> {
        debug!(id = %id, new_stock = %new_stock, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(new_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    /// Adds received purchase quantity to stock.
    pub async fn receive_stock(&self, id: &str, quantity: i64) -> StoreResult<()> {
        debug!(id = %id, quantity = %quantity, "Receiving stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    /// Conditionally decrements stock for a sale.
    ///
    /// Returns `Ok(true)` when the guard held and the decrement applied,
    /// `Ok(false)` when it did not (insufficient stock, inactive product,
    /// or unknown id). Never drives stock negative.
    pub async fn decrement_or_reject(&self, id: &str, quantity: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE products \
             SET stock = stock - ?2, units_sold = units_sold + ?2, updated_at = ?3 \
             WHERE id = ?1 AND is_active = 1 AND stock >= ?2",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        debug!(id = %id, quantity = %quantity, applied = %applied, "Conditional stock decrement");
        Ok(applied)
    }

    /// Reverses a previously applied decrement during compensation.
    pub async fn restore_stock(&self, id: &str, quantity: i64) -> StoreResult<()> {
        debug!(id = %id, quantity = %quantity, "Restoring stock");

        let result = sqlx::query(
            "UPDATE products \
             SET stock = stock + ?2, units_sold = units_sold - ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    /// Soft delete. The row survives for sale-history joins.
    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};
    use caja_core::NewProduct;

    async fn test_store() -> Store {
        Store::new(StoreConfig::in_memory()).await.unwrap()
    }

    fn test_product(branch: &str, sku: &str, stock: i64) -> Product {
        Product::new(NewProduct {
            branch_id: branch.into(),
            sku: sku.into(),
            name: format!("Product {sku}"),
            brand: Some("Marca".into()),
            category: Some("Abarrotes".into()),
            cost_cents: 700,
            price_cents: 1000,
            stock,
            low_stock_threshold: 3,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let store = test_store().await;
        let repo = store.products();
        let p = test_product("branch-1", "CAFE-500", 12);

        repo.insert(&p).await.unwrap();

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "CAFE-500");
        assert_eq!(by_id.stock, 12);
        assert!(by_id.is_active);

        let by_sku = repo.get_by_sku("branch-1", "CAFE-500").await.unwrap().unwrap();
        assert_eq!(by_sku.id, p.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_sku_in_branch_is_rejected() {
        let store = test_store().await;
        let repo = store.products();
        repo.insert(&test_product("branch-1", "DUP-1", 5)).await.unwrap();

        let err = repo.insert(&test_product("branch-1", "DUP-1", 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));

        // Same SKU in another branch is fine.
        repo.insert(&test_product("branch-2", "DUP-1", 5)).await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_scopes_to_branch_and_active() {
        let store = test_store().await;
        let repo = store.products();

        let active = test_product("branch-1", "A-1", 5);
        let foreign = test_product("branch-2", "B-1", 5);
        let mut inactive = test_product("branch-1", "C-1", 5);
        inactive.is_active = false;

        repo.insert(&active).await.unwrap();
        repo.insert(&foreign).await.unwrap();
        repo.insert(&inactive).await.unwrap();

        let snapshot = repo.snapshot("branch-1").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].sku, "A-1");

        assert_eq!(repo.count("branch-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_matches_name_and_sku() {
        let store = test_store().await;
        let repo = store.products();

        let mut cafe = test_product("branch-1", "CAFE-500", 5);
        cafe.name = "Café Molido 500g".into();
        let mut arroz = test_product("branch-1", "ARROZ-1KG", 5);
        arroz.name = "Arroz Extra 1kg".into();
        repo.insert(&cafe).await.unwrap();
        repo.insert(&arroz).await.unwrap();

        let hits = repo.search("branch-1", "arroz", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "ARROZ-1KG");

        let hits = repo.search("branch-1", "CAFE", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        // Empty query lists by name up to the limit.
        let hits = repo.search("branch-1", "", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].sku, "ARROZ-1KG");
    }

    #[tokio::test]
    async fn update_changes_catalog_fields_only() {
        let store = test_store().await;
        let repo = store.products();
        let mut p = test_product("branch-1", "A-1", 9);
        repo.insert(&p).await.unwrap();

        p.name = "Renamed".into();
        p.price_cents = 1500;
        p.stock = 999; // must be ignored by update()
        repo.update(&p).await.unwrap();

        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.price_cents, 1500);
        assert_eq!(stored.stock, 9);
    }

    #[tokio::test]
    async fn conditional_decrement_applies_and_rejects() {
        let store = test_store().await;
        let repo = store.products();
        let p = test_product("branch-1", "A-1", 5);
        repo.insert(&p).await.unwrap();

        assert!(repo.decrement_or_reject(&p.id, 3).await.unwrap());
        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
        assert_eq!(stored.units_sold, 3);

        // Guard fails: only 2 left.
        assert!(!repo.decrement_or_reject(&p.id, 3).await.unwrap());
        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
        assert_eq!(stored.units_sold, 3);

        // Unknown product reports a failed guard, not an error.
        assert!(!repo.decrement_or_reject("missing", 1).await.unwrap());
    }

    #[tokio::test]
    async fn decrement_rejects_inactive_product() {
        let store = test_store().await;
        let repo = store.products();
        let p = test_product("branch-1", "A-1", 5);
        repo.insert(&p).await.unwrap();
        repo.deactivate(&p.id).await.unwrap();

        assert!(!repo.decrement_or_reject(&p.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn restore_reverses_decrement() {
        let store = test_store().await;
        let repo = store.products();
        let p = test_product("branch-1", "A-1", 5);
        repo.insert(&p).await.unwrap();

        repo.decrement_or_reject(&p.id, 4).await.unwrap();
        repo.restore_stock(&p.id, 4).await.unwrap();

        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
        assert_eq!(stored.units_sold, 0);
    }

    #[tokio::test]
    async fn stock_adjust_and_receive() {
        let store = test_store().await;
        let repo = store.products();
        let p = test_product("branch-1", "A-1", 5);
        repo.insert(&p).await.unwrap();

        repo.adjust_stock(&p.id, 47).await.unwrap();
        assert_eq!(repo.get_by_id(&p.id).await.unwrap().unwrap().stock, 47);

        repo.receive_stock(&p.id, 3).await.unwrap();
        assert_eq!(repo.get_by_id(&p.id).await.unwrap().unwrap().stock, 50);

        assert!(matches!(
            repo.adjust_stock("missing", 1).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn low_stock_listing() {
        let store = test_store().await;
        let repo = store.products();

        let low = test_product("branch-1", "LOW-1", 2); // threshold 3
        let ok = test_product("branch-1", "OK-1", 50);
        repo.insert(&low).await.unwrap();
        repo.insert(&ok).await.unwrap();

        let listed = repo.list_low_stock("branch-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sku, "LOW-1");
    }
}
