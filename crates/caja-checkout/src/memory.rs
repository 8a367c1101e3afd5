//! In-memory [`CheckoutStore`] for tests and local development.
//!
//! Behaves like the SQLite adapter, including the foreign-key rule that a
//! header cannot be deleted while lines still reference it. A
//! [`FaultPlan`] injects failures at chosen steps, which is how the
//! compensation paths get exercised without a flaky backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use caja_core::{Product, SaleHeader, SaleLine, SaleStatus};

use crate::port::{BackendError, CheckoutStore, DecrementOutcome, StockLevel};

/// Failure injection plan. Counters burn down: a value of 2 fails the
/// next two calls of that operation and then behaves normally.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    pub fail_stock_levels: u32,
    /// Stock lookups never resolve. Pair with a short io timeout, or
    /// cancel the caller.
    pub hang_stock_levels: bool,
    pub fail_insert_header: u32,
    pub fail_insert_lines: u32,
    /// Fails the nth decrement call, 1-based, counted across the store's
    /// lifetime. One-shot: cleared once it fires.
    pub fail_nth_decrement: Option<u32>,
    /// Removes stock from the named product right before the next
    /// decrement resolves, the way a concurrent sale at another terminal
    /// would. One-shot.
    pub steal_before_decrement: Option<(String, i64)>,
    /// Decrement calls never resolve. Pair with a short io timeout.
    pub hang_decrements: bool,
    pub fail_restore_stock: u32,
    pub fail_delete_lines: u32,
    pub fail_delete_header: u32,
    pub fail_void_header: u32,
}

#[derive(Debug, Clone)]
struct ProductRecord {
    branch_id: String,
    sku: String,
    stock: i64,
    units_sold: i64,
    is_active: bool,
}

#[derive(Default)]
struct State {
    products: HashMap<String, ProductRecord>,
    headers: HashMap<String, SaleHeader>,
    lines: HashMap<String, Vec<SaleLine>>,
    faults: FaultPlan,
    decrement_calls: u32,
}

/// In-memory store. Cheap to construct, safe to share between tasks.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product with its current stock figures.
    pub fn insert_product(&self, product: &Product) {
        let mut st = self.state.lock().expect("state mutex poisoned");
        st.products.insert(
            product.id.clone(),
            ProductRecord {
                branch_id: product.branch_id.clone(),
                sku: product.sku.clone(),
                stock: product.stock,
                units_sold: product.units_sold,
                is_active: product.is_active,
            },
        );
    }

    pub fn set_faults(&self, faults: FaultPlan) {
        self.state.lock().expect("state mutex poisoned").faults = faults;
    }

    // ===== Assertions for tests =====

    pub fn stock_of(&self, product_id: &str) -> Option<i64> {
        let st = self.state.lock().expect("state mutex poisoned");
        st.products.get(product_id).map(|r| r.stock)
    }

    pub fn units_sold_of(&self, product_id: &str) -> Option<i64> {
        let st = self.state.lock().expect("state mutex poisoned");
        st.products.get(product_id).map(|r| r.units_sold)
    }

    pub fn sale_count(&self) -> usize {
        self.state.lock().expect("state mutex poisoned").headers.len()
    }

    pub fn header(&self, sale_id: &str) -> Option<SaleHeader> {
        let st = self.state.lock().expect("state mutex poisoned");
        st.headers.get(sale_id).cloned()
    }

    pub fn lines_of(&self, sale_id: &str) -> Vec<SaleLine> {
        let st = self.state.lock().expect("state mutex poisoned");
        st.lines.get(sale_id).cloned().unwrap_or_default()
    }
}

fn take(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn stock_levels(
        &self,
        branch_id: &str,
        product_ids: &[String],
    ) -> Result<Vec<StockLevel>, BackendError> {
        let hang = {
            let st = self.state.lock().expect("state mutex poisoned");
            st.faults.hang_stock_levels
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_stock_levels) {
            return Err(BackendError::new("injected stock_levels failure"));
        }

        let levels = product_ids
            .iter()
            .filter_map(|id| {
                st.products.get(id).and_then(|rec| {
                    (rec.is_active && rec.branch_id == branch_id).then(|| StockLevel {
                        product_id: id.clone(),
                        sku: rec.sku.clone(),
                        stock: rec.stock,
                    })
                })
            })
            .collect();
        Ok(levels)
    }

    async fn insert_header(&self, header: &SaleHeader) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_insert_header) {
            return Err(BackendError::new("injected insert_header failure"));
        }
        if st.headers.contains_key(&header.id) {
            return Err(BackendError::new(format!("sale {} already exists", header.id)));
        }
        st.headers.insert(header.id.clone(), header.clone());
        Ok(())
    }

    async fn insert_lines(&self, lines: &[SaleLine]) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_insert_lines) {
            return Err(BackendError::new("injected insert_lines failure"));
        }
        let Some(first) = lines.first() else {
            return Ok(());
        };
        if !st.headers.contains_key(&first.sale_id) {
            return Err(BackendError::new(format!("unknown sale {}", first.sale_id)));
        }
        st.lines.insert(first.sale_id.clone(), lines.to_vec());
        Ok(())
    }

    async fn apply_stock_decrement(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, BackendError> {
        let hang = {
            let st = self.state.lock().expect("state mutex poisoned");
            st.faults.hang_decrements
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut st = self.state.lock().expect("state mutex poisoned");
        st.decrement_calls += 1;
        if st.faults.fail_nth_decrement == Some(st.decrement_calls) {
            st.faults.fail_nth_decrement = None;
            return Err(BackendError::new("injected decrement failure"));
        }
        if let Some((stolen_id, stolen_qty)) = st.faults.steal_before_decrement.take() {
            if let Some(rec) = st.products.get_mut(&stolen_id) {
                rec.stock -= stolen_qty;
                rec.units_sold += stolen_qty;
            }
        }

        match st.products.get_mut(product_id) {
            Some(rec) if rec.is_active && rec.stock >= quantity => {
                rec.stock -= quantity;
                rec.units_sold += quantity;
                Ok(DecrementOutcome::Applied)
            }
            Some(rec) if rec.is_active => Ok(DecrementOutcome::Insufficient {
                available: rec.stock,
            }),
            _ => Ok(DecrementOutcome::Insufficient { available: 0 }),
        }
    }

    async fn restore_stock(&self, product_id: &str, quantity: i64) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_restore_stock) {
            return Err(BackendError::new("injected restore_stock failure"));
        }
        match st.products.get_mut(product_id) {
            Some(rec) => {
                rec.stock += quantity;
                rec.units_sold -= quantity;
                Ok(())
            }
            None => Err(BackendError::new(format!("unknown product {product_id}"))),
        }
    }

    async fn delete_lines(&self, sale_id: &str) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_delete_lines) {
            return Err(BackendError::new("injected delete_lines failure"));
        }
        st.lines.remove(sale_id);
        Ok(())
    }

    async fn delete_header(&self, sale_id: &str) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_delete_header) {
            return Err(BackendError::new("injected delete_header failure"));
        }
        // Same rule the SQLite foreign key enforces.
        if st.lines.get(sale_id).is_some_and(|l| !l.is_empty()) {
            return Err(BackendError::new(format!(
                "sale {sale_id} still has lines"
            )));
        }
        st.headers.remove(sale_id);
        Ok(())
    }

    async fn void_header(&self, sale_id: &str) -> Result<(), BackendError> {
        let mut st = self.state.lock().expect("state mutex poisoned");
        if take(&mut st.faults.fail_void_header) {
            return Err(BackendError::new("injected void_header failure"));
        }
        match st.headers.get_mut(sale_id) {
            Some(header) => {
                header.status = SaleStatus::Voided;
                Ok(())
            }
            None => Err(BackendError::new(format!("unknown sale {sale_id}"))),
        }
    }
}
