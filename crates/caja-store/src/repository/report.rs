//! # Report Repository
//!
//! Read-only summaries for the reporting screens: period sales, the
//! register-close payment breakdown, and period purchases. No business
//! logic here; each method is a single aggregate query over committed
//! rows. Voided sales are excluded everywhere.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use caja_core::PaymentMethod;

// =============================================================================
// Report DTOs
// =============================================================================

/// Aggregate figures for completed sales in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
    pub profit_cents: i64,
    /// revenue / sale_count, zero when there were no sales.
    #[sqlx(skip)]
    pub avg_ticket_cents: i64,
}

/// One payment method's slice of the register close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PaymentBucket {
    pub payment_method: PaymentMethod,
    pub sale_count: i64,
    pub total_cents: i64,
}

/// Aggregate figures for purchases placed in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PurchasesSummary {
    pub purchase_count: i64,
    pub total_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales figures for a branch between `from` and `to` inclusive.
    pub async fn sales_summary(
        &self,
        branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<SalesSummary> {
        debug!(branch_id = %branch_id, "Computing sales summary");

        let mut summary = sqlx::query_as::<_, SalesSummary>(
            "SELECT COUNT(*) AS sale_count, \
                    COALESCE(SUM(item_count), 0) AS units_sold, \
                    COALESCE(SUM(total_cents), 0) AS revenue_cents, \
                    COALESCE(SUM(profit_cents), 0) AS profit_cents \
             FROM sales \
             WHERE branch_id = ?1 AND status = 'completed' \
             AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(branch_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        summary.avg_ticket_cents = if summary.sale_count > 0 {
            summary.revenue_cents / summary.sale_count
        } else {
            0
        };
        Ok(summary)
    }

    /// Register-close breakdown: totals per payment method for the period.
    pub async fn payment_breakdown(
        &self,
        branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<PaymentBucket>> {
        let buckets = sqlx::query_as::<_, PaymentBucket>(
            "SELECT payment_method, \
                    COUNT(*) AS sale_count, \
                    COALESCE(SUM(total_cents), 0) AS total_cents \
             FROM sales \
             WHERE branch_id = ?1 AND status = 'completed' \
             AND created_at >= ?2 AND created_at <= ?3 \
             GROUP BY payment_method \
             ORDER BY payment_method",
        )
        .bind(branch_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(buckets)
    }

    /// Purchases placed in the period, any status.
    pub async fn purchases_summary(
        &self,
        branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<PurchasesSummary> {
        let summary = sqlx::query_as::<_, PurchasesSummary>(
            "SELECT COUNT(*) AS purchase_count, \
                    COALESCE(SUM(total_cents), 0) AS total_cents \
             FROM purchases \
             WHERE branch_id = ?1 AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(branch_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Store, StoreConfig};
    use chrono::Duration;
    use caja_core::{NewProduct, Product, PurchaseDraft, SaleHeader, SaleStatus};
    use uuid::Uuid;

    async fn test_store() -> Store {
        Store::new(StoreConfig::in_memory()).await.unwrap()
    }

    fn header(
        payment: PaymentMethod,
        status: SaleStatus,
        total: i64,
        profit: i64,
        units: i64,
        minutes_ago: i64,
    ) -> SaleHeader {
        SaleHeader {
            id: Uuid::new_v4().to_string(),
            branch_id: "branch-1".into(),
            user_id: "user-1".into(),
            customer_id: None,
            payment_method: payment,
            status,
            subtotal_cents: total,
            discount_cents: 0,
            total_cents: total,
            profit_cents: profit,
            item_count: units,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn summary_counts_only_completed_sales_in_range() {
        let store = test_store().await;
        let sales = store.sales();

        sales
            .insert_header(&header(PaymentMethod::Cash, SaleStatus::Completed, 1000, 300, 2, 5))
            .await
            .unwrap();
        sales
            .insert_header(&header(PaymentMethod::Card, SaleStatus::Completed, 3000, 900, 1, 10))
            .await
            .unwrap();
        // Voided: excluded.
        sales
            .insert_header(&header(PaymentMethod::Cash, SaleStatus::Voided, 500, 100, 1, 7))
            .await
            .unwrap();
        // Out of range: excluded.
        sales
            .insert_header(&header(PaymentMethod::Cash, SaleStatus::Completed, 9000, 100, 1, 60 * 24 * 3))
            .await
            .unwrap();

        let from = Utc::now() - Duration::hours(1);
        let to = Utc::now();
        let summary = store
            .reports()
            .sales_summary("branch-1", from, to)
            .await
            .unwrap();

        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.revenue_cents, 4000);
        assert_eq!(summary.profit_cents, 1200);
        assert_eq!(summary.avg_ticket_cents, 2000);
    }

    #[tokio::test]
    async fn empty_period_yields_zeroes() {
        let store = test_store().await;
        let from = Utc::now() - Duration::hours(1);
        let summary = store
            .reports()
            .sales_summary("branch-1", from, Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.sale_count, 0);
        assert_eq!(summary.revenue_cents, 0);
        assert_eq!(summary.avg_ticket_cents, 0);
    }

    #[tokio::test]
    async fn breakdown_groups_by_payment_method() {
        let store = test_store().await;
        let sales = store.sales();

        for total in [1000, 2000] {
            sales
                .insert_header(&header(PaymentMethod::Cash, SaleStatus::Completed, total, 0, 1, 5))
                .await
                .unwrap();
        }
        sales
            .insert_header(&header(PaymentMethod::Transfer, SaleStatus::Completed, 700, 0, 1, 5))
            .await
            .unwrap();

        let from = Utc::now() - Duration::hours(1);
        let buckets = store
            .reports()
            .payment_breakdown("branch-1", from, Utc::now())
            .await
            .unwrap();

        assert_eq!(buckets.len(), 2);
        let cash = buckets
            .iter()
            .find(|b| b.payment_method == PaymentMethod::Cash)
            .unwrap();
        assert_eq!(cash.sale_count, 2);
        assert_eq!(cash.total_cents, 3000);
        let transfer = buckets
            .iter()
            .find(|b| b.payment_method == PaymentMethod::Transfer)
            .unwrap();
        assert_eq!(transfer.total_cents, 700);
    }

    #[tokio::test]
    async fn purchases_summary_totals_period_orders() {
        let store = test_store().await;

        let product = Product::new(NewProduct {
            branch_id: "branch-1".into(),
            sku: "A-1".into(),
            name: "Product A".into(),
            brand: None,
            category: None,
            cost_cents: 500,
            price_cents: 900,
            stock: 10,
            low_stock_threshold: 0,
        })
        .unwrap();
        store.products().insert(&product).await.unwrap();

        let mut draft = PurchaseDraft::new("branch-1", "Proveedor").unwrap();
        draft.add_line(&product, 10, 500).unwrap();
        store.purchases().insert_draft(&draft).await.unwrap();

        let from = Utc::now() - Duration::hours(1);
        let summary = store
            .reports()
            .purchases_summary("branch-1", from, Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.purchase_count, 1);
        assert_eq!(summary.total_cents, 5000);
    }
}
