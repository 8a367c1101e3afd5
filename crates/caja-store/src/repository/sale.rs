//! # Sale Repository
//!
//! Persistence for sale headers and lines. This repository only moves rows;
//! the commit ordering, stock decrements and compensation live in
//! `caja-checkout`.
//!
//! Lines are written in a single transaction so a sale never has a partial
//! line set. Deleting a header while its lines still exist is blocked by
//! the foreign key, which is why compensation falls back to voiding when
//! the delete fails.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use caja_core::{SaleHeader, SaleLine};

const HEADER_COLUMNS: &str = "id, branch_id, user_id, customer_id, payment_method, status, \
     subtotal_cents, discount_cents, total_cents, profit_cents, item_count, created_at";

const LINE_COLUMNS: &str = "id, sale_id, product_id, sku_snapshot, name_snapshot, line_no, \
     quantity, unit_price_cents, unit_cost_cents, line_total_cents, profit_cents";

/// Repository for sale rows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // ===== Writes =====

    /// Inserts the sale header.
    pub async fn insert_header(&self, header: &SaleHeader) -> StoreResult<()> {
        debug!(sale_id = %header.id, total_cents = %header.total_cents, "Inserting sale header");

        sqlx::query(
            "INSERT INTO sales (id, branch_id, user_id, customer_id, payment_method, status, \
             subtotal_cents, discount_cents, total_cents, profit_cents, item_count, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&header.id)
        .bind(&header.branch_id)
        .bind(&header.user_id)
        .bind(&header.customer_id)
        .bind(header.payment_method)
        .bind(header.status)
        .bind(header.subtotal_cents)
        .bind(header.discount_cents)
        .bind(header.total_cents)
        .bind(header.profit_cents)
        .bind(header.item_count)
        .bind(header.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts all lines of a sale in one transaction. Either every line
    /// lands or none do.
    pub async fn insert_lines(&self, lines: &[SaleLine]) -> StoreResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        debug!(sale_id = %lines[0].sale_id, count = lines.len(), "Inserting sale lines");

        let mut tx = self.pool.begin().await?;
        for line in lines {
            sqlx::query(
                "INSERT INTO sale_lines (id, sale_id, product_id, sku_snapshot, name_snapshot, \
                 line_no, quantity, unit_price_cents, unit_cost_cents, line_total_cents, profit_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .bind(&line.id)
            .bind(&line.sale_id)
            .bind(&line.product_id)
            .bind(&line.sku_snapshot)
            .bind(&line.name_snapshot)
            .bind(line.line_no)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.unit_cost_cents)
            .bind(line.line_total_cents)
            .bind(line.profit_cents)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Deletes every line of a sale. Returns the number of rows removed;
    /// zero is not an error, compensation may run before any line landed.
    pub async fn delete_lines(&self, sale_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        debug!(sale_id = %sale_id, deleted = result.rows_affected(), "Deleted sale lines");
        Ok(result.rows_affected())
    }

    /// Deletes a sale header. Fails while lines still reference it.
    pub async fn delete_header(&self, sale_id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Sale", sale_id));
        }
        Ok(())
    }

    /// Marks a sale voided, keeping its rows for audit.
    pub async fn void_header(&self, sale_id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE sales SET status = 'voided' WHERE id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Sale", sale_id));
        }
        Ok(())
    }

    // ===== Reads =====

    /// Fetches a sale header by id.
    pub async fn get_header(&self, sale_id: &str) -> StoreResult<Option<SaleHeader>> {
        let sql = format!("SELECT {HEADER_COLUMNS} FROM sales WHERE id = ?1");
        let header = sqlx::query_as::<_, SaleHeader>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(header)
    }

    /// Fetches a sale's lines in line-number order.
    pub async fn get_lines(&self, sale_id: &str) -> StoreResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Most recent sales for a branch, newest first.
    pub async fn list_recent(&self, branch_id: &str, limit: u32) -> StoreResult<Vec<SaleHeader>> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM sales \
             WHERE branch_id = ?1 \
             ORDER BY created_at DESC \
             LIMIT ?2"
        );
        let headers = sqlx::query_as::<_, SaleHeader>(&sql)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(headers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};
    use chrono::{Duration, Utc};
    use caja_core::{NewProduct, PaymentMethod, Product, SaleStatus};
    use uuid::Uuid;

    async fn test_store() -> Store {
        Store::new(StoreConfig::in_memory()).await.unwrap()
    }

    async fn seeded_product(store: &Store, sku: &str) -> Product {
        let p = Product::new(NewProduct {
            branch_id: "branch-1".into(),
            sku: sku.into(),
            name: format!("Product {sku}"),
            brand: None,
            category: None,
            cost_cents: 700,
            price_cents: 1000,
            stock: 10,
            low_stock_threshold: 0,
        })
        .unwrap();
        store.products().insert(&p).await.unwrap();
        p
    }

    fn test_header(minutes_ago: i64) -> SaleHeader {
        SaleHeader {
            id: Uuid::new_v4().to_string(),
            branch_id: "branch-1".into(),
            user_id: "user-1".into(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            subtotal_cents: 2000,
            discount_cents: 0,
            total_cents: 2000,
            profit_cents: 600,
            item_count: 2,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn test_line(sale_id: &str, product: &Product, line_no: i64, quantity: i64) -> SaleLine {
        SaleLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.into(),
            product_id: product.id.clone(),
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            line_no,
            quantity,
            unit_price_cents: product.price_cents,
            unit_cost_cents: product.cost_cents,
            line_total_cents: product.price_cents * quantity,
            profit_cents: (product.price_cents - product.cost_cents) * quantity,
        }
    }

    #[tokio::test]
    async fn header_and_lines_round_trip() {
        let store = test_store().await;
        let repo = store.sales();
        let product = seeded_product(&store, "A-1").await;

        let header = test_header(0);
        repo.insert_header(&header).await.unwrap();
        repo.insert_lines(&[
            test_line(&header.id, &product, 1, 1),
            test_line(&header.id, &product, 2, 1),
        ])
        .await
        .unwrap();

        let stored = repo.get_header(&header.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
        assert_eq!(stored.status, SaleStatus::Completed);
        assert_eq!(stored.total_cents, 2000);

        let lines = repo.get_lines(&header.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[1].line_no, 2);
        assert_eq!(lines[0].sku_snapshot, "A-1");
    }

    #[tokio::test]
    async fn lines_for_unknown_sale_are_rejected() {
        let store = test_store().await;
        let repo = store.sales();
        let product = seeded_product(&store, "A-1").await;

        let err = repo
            .insert_lines(&[test_line("no-such-sale", &product, 1, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn header_delete_blocked_until_lines_removed() {
        let store = test_store().await;
        let repo = store.sales();
        let product = seeded_product(&store, "A-1").await;

        let header = test_header(0);
        repo.insert_header(&header).await.unwrap();
        repo.insert_lines(&[test_line(&header.id, &product, 1, 2)])
            .await
            .unwrap();

        let err = repo.delete_header(&header.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));

        assert_eq!(repo.delete_lines(&header.id).await.unwrap(), 1);
        repo.delete_header(&header.id).await.unwrap();
        assert!(repo.get_header(&header.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn void_keeps_rows() {
        let store = test_store().await;
        let repo = store.sales();

        let header = test_header(0);
        repo.insert_header(&header).await.unwrap();
        repo.void_header(&header.id).await.unwrap();

        let stored = repo.get_header(&header.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Voided);

        assert!(matches!(
            repo.void_header("missing").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn recent_sales_newest_first() {
        let store = test_store().await;
        let repo = store.sales();

        let old = test_header(30);
        let new = test_header(1);
        repo.insert_header(&old).await.unwrap();
        repo.insert_header(&new).await.unwrap();

        let recent = repo.list_recent("branch-1", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, new.id);

        let limited = repo.list_recent("branch-1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn delete_lines_of_empty_sale_is_zero_not_error() {
        let store = test_store().await;
        let repo = store.sales();

        let header = test_header(0);
        repo.insert_header(&header).await.unwrap();
        assert_eq!(repo.delete_lines(&header.id).await.unwrap(), 0);
    }
}
