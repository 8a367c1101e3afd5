//! # Customer Repository
//!
//! Plain CRUD for registered customers. Sales reference customers by id,
//! so customers are soft-deleted like products: `deactivate` hides them
//! from listings while their sale history stays joinable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use caja_core::Customer;

const CUSTOMER_COLUMNS: &str =
    "id, branch_id, name, document, phone, email, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn insert(&self, customer: &Customer) -> StoreResult<()> {
        debug!(name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, branch_id, name, document, phone, email, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&customer.id)
        .bind(&customer.branch_id)
        .bind(&customer.name)
        .bind(&customer.document)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, customer: &Customer) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET name = ?2, document = ?3, phone = ?4, email = ?5, updated_at = ?6 \
             WHERE id = ?1",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.document)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", &customer.id));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// All active customers of a branch, by name.
    pub async fn list(&self, branch_id: &str) -> StoreResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE branch_id = ?1 AND is_active = 1 \
             ORDER BY name"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(branch_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    /// Contains-match over name and document, active customers only.
    pub async fn search(&self, branch_id: &str, query: &str, limit: u32) -> StoreResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE branch_id = ?1 AND is_active = 1 \
               AND (name LIKE ?2 OR document LIKE ?2) \
             ORDER BY name \
             LIMIT ?3"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(branch_id)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    /// Soft delete. The row survives for sale-history joins.
    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Customer", id));
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

    async fn test_store() -> Store {
        Store::new(StoreConfig::in_memory()).await.unwrap()
    }

    fn test_customer(name: &str) -> Customer {
        let mut c = Customer::new("branch-1", name).unwrap();
        c.document = Some("40123456".into());
        c.phone = Some("999888777".into());
        c
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = test_store().await;
        let repo = store.customers();

        let mut c = test_customer("María Gómez");
        repo.insert(&c).await.unwrap();

        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "María Gómez");
        assert_eq!(stored.document.as_deref(), Some("40123456"));

        c.phone = Some("111222333".into());
        c.email = Some("maria@example.com".into());
        repo.update(&c).await.unwrap();

        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("111222333"));
        assert_eq!(stored.email.as_deref(), Some("maria@example.com"));

        // Deactivation hides the customer from listings but keeps the row.
        repo.deactivate(&c.id).await.unwrap();
        assert!(repo.list("branch-1").await.unwrap().is_empty());
        assert!(repo.search("branch-1", "María", 10).await.unwrap().is_empty());
        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn search_by_name_or_document() {
        let store = test_store().await;
        let repo = store.customers();

        repo.insert(&test_customer("María Gómez")).await.unwrap();
        let mut other = Customer::new("branch-1", "Juan Pérez").unwrap();
        other.document = Some("70999888".into());
        repo.insert(&other).await.unwrap();

        let hits = repo.search("branch-1", "Gómez", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "María Gómez");

        let hits = repo.search("branch-1", "70999", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Juan Pérez");

        assert_eq!(repo.list("branch-1").await.unwrap().len(), 2);
        assert!(repo.list("branch-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_customer_reports_not_found() {
        let store = test_store().await;
        let repo = store.customers();

        assert!(matches!(
            repo.deactivate("missing").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        let ghost = test_customer("Ghost");
        assert!(matches!(
            repo.update(&ghost).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }
}
