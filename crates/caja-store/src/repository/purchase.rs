//! # Purchase Repository
//!
//! Supplier purchase orders. Saving a purchase stores rows only; stock
//! moves when the goods arrive, via `ProductRepository::receive_stock`,
//! one call per line. The two steps are deliberately separate operations:
//! an order can sit in `pending` for days.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use caja_core::{Purchase, PurchaseDraft, PurchaseLine};

const PURCHASE_COLUMNS: &str =
    "id, branch_id, supplier, status, total_cents, item_count, created_at, received_at";

const LINE_COLUMNS: &str = "id, purchase_id, product_id, sku_snapshot, name_snapshot, \
     quantity, unit_cost_cents, line_total_cents";

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Persists a draft (header plus lines) in one transaction.
    pub async fn insert_draft(&self, draft: &PurchaseDraft) -> StoreResult<()> {
        debug!(
            purchase_id = %draft.purchase.id,
            supplier = %draft.purchase.supplier,
            lines = draft.lines.len(),
            "Inserting purchase"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO purchases (id, branch_id, supplier, status, total_cents, item_count, \
             created_at, received_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&draft.purchase.id)
        .bind(&draft.purchase.branch_id)
        .bind(&draft.purchase.supplier)
        .bind(draft.purchase.status)
        .bind(draft.purchase.total_cents)
        .bind(draft.purchase.item_count)
        .bind(draft.purchase.created_at)
        .bind(draft.purchase.received_at)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO purchase_lines (id, purchase_id, product_id, sku_snapshot, \
                 name_snapshot, quantity, unit_cost_cents, line_total_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&line.id)
            .bind(&line.purchase_id)
            .bind(&line.product_id)
            .bind(&line.sku_snapshot)
            .bind(&line.name_snapshot)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Purchase>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(purchase)
    }

    pub async fn get_lines(&self, purchase_id: &str) -> StoreResult<Vec<PurchaseLine>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM purchase_lines WHERE purchase_id = ?1");
        let lines = sqlx::query_as::<_, PurchaseLine>(&sql)
            .bind(purchase_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Purchases of a branch, newest first.
    pub async fn list(&self, branch_id: &str, limit: u32) -> StoreResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE branch_id = ?1 \
             ORDER BY created_at DESC \
             LIMIT ?2"
        );
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchases)
    }

    /// Flips a pending purchase to `completed` and stamps `received_at`.
    ///
    /// The caller is responsible for the matching `receive_stock` calls.
    /// Fails for unknown ids and for purchases already received.
    pub async fn mark_received(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE purchases SET status = 'completed', received_at = ?2 \
             WHERE id = ?1 AND status = 'pending'",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Pending purchase", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
