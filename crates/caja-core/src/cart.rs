//! Cart aggregator.
//!
//! The cart is the in-memory staging area for a sale. It enforces the
//! advisory stock ceiling and freezes each line's unit price at the moment
//! the product is first added, so a concurrent catalog price edit never
//! changes what the customer was quoted.
//!
//! The ceiling is advisory only. The authoritative stock check happens at
//! commit time in `caja-checkout`, where a conditional decrement settles
//! races between terminals.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Product, Session};
use crate::{validation, MAX_CART_LINES, MAX_LINE_QUANTITY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CartLine
// =============================================================================

/// One product in the cart, at most one line per product.
///
/// `unit_price_cents` and `unit_cost_cents` are frozen at first add.
/// `available_stock` is the stock observed on the most recent successful
/// add and is only advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
    pub available_stock: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    pub fn line_profit(&self) -> Money {
        Money::from_cents(self.unit_price_cents - self.unit_cost_cents)
            .multiply_quantity(self.quantity)
    }
}

// =============================================================================
// CartTotals
// =============================================================================

/// Aggregated cart figures. Recomputed from the lines on every call, so
/// they can never drift out of sync with the cart contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Number of distinct product lines.
    pub line_count: usize,
    /// Total units across all lines.
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub profit_cents: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// A branch-scoped cart.
///
/// All mutation methods either fully apply or leave the cart untouched;
/// a rejected `add_line` never changes a line, a quantity, or the
/// advisory stock figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    branch_id: String,
    lines: Vec<CartLine>,
    customer_id: Option<String>,
    payment_method: Option<PaymentMethod>,
    discount_cents: i64,
    created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(branch_id: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
            lines: Vec::new(),
            customer_id: None,
            payment_method: None,
            discount_cents: 0,
            created_at: Utc::now(),
        }
    }

    /// Convenience constructor scoped to the session's branch.
    pub fn for_session(session: &Session) -> Self {
        Self::new(session.branch_id.clone())
    }

    // ===== Accessors =====

    pub fn branch_id(&self) -> &str {
        &self.branch_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn discount_cents(&self) -> i64 {
        self.discount_cents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ===== Mutations =====

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// On a merge the advisory stock is refreshed from the product passed
    /// in, but the frozen unit price is kept from the first add. Rejection
    /// reasons, checked in order:
    ///
    /// - quantity not positive
    /// - product inactive ([`CoreError::ProductInactive`])
    /// - product belongs to another branch ([`CoreError::BranchMismatch`])
    /// - cart already holds [`MAX_CART_LINES`] lines (new lines only)
    /// - resulting quantity above [`MAX_LINE_QUANTITY`]
    /// - resulting quantity above the product's stock
    ///   ([`CoreError::StockExceeded`])
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".into(),
            }
            .into());
        }
        if !product.is_active {
            return Err(CoreError::ProductInactive {
                sku: product.sku.clone(),
            });
        }
        if product.branch_id != self.branch_id {
            return Err(CoreError::BranchMismatch {
                entity: product.sku.clone(),
                expected: self.branch_id.clone(),
                found: product.branch_id.clone(),
            });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                let merged = line.quantity + quantity;
                if merged > MAX_LINE_QUANTITY {
                    return Err(CoreError::QuantityTooLarge {
                        requested: merged,
                        max: MAX_LINE_QUANTITY,
                    });
                }
                if merged > product.stock {
                    return Err(CoreError::StockExceeded {
                        sku: product.sku.clone(),
                        requested: merged,
                        available: product.stock,
                    });
                }
                line.quantity = merged;
                line.available_stock = product.stock;
            }
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }
                if quantity > MAX_LINE_QUANTITY {
                    return Err(CoreError::QuantityTooLarge {
                        requested: quantity,
                        max: MAX_LINE_QUANTITY,
                    });
                }
                if quantity > product.stock {
                    return Err(CoreError::StockExceeded {
                        sku: product.sku.clone(),
                        requested: quantity,
                        available: product.stock,
                    });
                }
                self.lines.push(CartLine {
                    product_id: product.id.clone(),
                    sku: product.sku.clone(),
                    name: product.name.clone(),
                    unit_price_cents: product.price_cents,
                    unit_cost_cents: product.cost_cents,
                    available_stock: product.stock,
                    quantity,
                    added_at: Utc::now(),
                });
            }
        }
        Ok(())
    }

    /// Sets a line's quantity directly (the quantity box on the POS screen).
    ///
    /// A quantity of zero or less removes the line. Anything else is
    /// clamped to `[1, available_stock]`, also capped at
    /// [`MAX_LINE_QUANTITY`]. Returns the effective quantity after
    /// clamping, `0` when the line was removed.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<i64> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound {
                product_id: product_id.to_string(),
            })?;

        if quantity <= 0 {
            self.lines.remove(idx);
            return Ok(0);
        }

        let line = &mut self.lines[idx];
        let ceiling = line.available_stock.min(MAX_LINE_QUANTITY).max(1);
        let effective = quantity.clamp(1, ceiling);
        line.quantity = effective;
        Ok(effective)
    }

    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound {
                product_id: product_id.to_string(),
            })?;
        self.lines.remove(idx);
        Ok(())
    }

    /// Empties the cart and resets customer, payment method and discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer_id = None;
        self.payment_method = None;
        self.discount_cents = 0;
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    pub fn select_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id;
    }

    /// Sets a manual whole-cart discount. Must be between zero and the
    /// current subtotal.
    pub fn set_discount(&mut self, discount_cents: i64) -> CoreResult<()> {
        validation::validate_discount(discount_cents, self.totals_without_discount())?;
        self.discount_cents = discount_cents;
        Ok(())
    }

    // ===== Totals =====

    /// Computes the cart totals from scratch.
    ///
    /// Profit is taken on the full line prices; the discount reduces the
    /// total the customer pays but is not re-allocated across lines.
    pub fn totals(&self) -> CartTotals {
        let mut subtotal = Money::zero();
        let mut profit = Money::zero();
        let mut total_quantity = 0i64;
        for line in &self.lines {
            subtotal += line.line_total();
            profit += line.line_profit();
            total_quantity += line.quantity;
        }
        // Lines can shrink after the discount was set; never let the
        // discount push the total below zero.
        let discount = self.discount_cents.min(subtotal.cents()).max(0);
        CartTotals {
            line_count: self.lines.len(),
            total_quantity,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount,
            total_cents: subtotal.cents() - discount,
            profit_cents: profit.cents(),
        }
    }

    fn totals_without_discount(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total().cents()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewProduct;

    fn product(sku: &str, price_cents: i64, cost_cents: i64, stock: i64) -> Product {
        Product::new(NewProduct {
            branch_id: "branch-1".into(),
            sku: sku.into(),
            name: format!("Product {sku}"),
            brand: None,
            category: None,
            cost_cents,
            price_cents,
            stock,
            low_stock_threshold: 0,
        })
        .unwrap()
    }

    #[test]
    fn two_products_produce_expected_totals() {
        let a = product("A-1", 10000, 6000, 10);
        let b = product("B-1", 25000, 15000, 5);

        let mut cart = Cart::new("branch-1");
        cart.add_line(&a, 2).unwrap();
        cart.add_line(&b, 1).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.subtotal_cents, 45000);
        assert_eq!(totals.discount_cents, 0);
        assert_eq!(totals.total_cents, 45000);
        // (10000-6000)*2 + (25000-15000)*1
        assert_eq!(totals.profit_cents, 18000);
    }

    #[test]
    fn adding_same_product_merges_into_one_line() {
        let p = product("A-1", 1000, 600, 10);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 2).unwrap();
        cart.add_line(&p, 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&p.id).unwrap().quantity, 5);
    }

    #[test]
    fn unit_price_frozen_at_first_add() {
        let mut p = product("A-1", 1000, 600, 10);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 1).unwrap();

        // Catalog price changes between adds.
        p.price_cents = 1500;
        cart.add_line(&p, 1).unwrap();

        let line = cart.line(&p.id).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price_cents, 1000);
        assert_eq!(cart.totals().subtotal_cents, 2000);
    }

    #[test]
    fn merge_refreshes_advisory_stock() {
        let mut p = product("A-1", 1000, 600, 5);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 4).unwrap();

        // Restock happens; a merge that the old figure would reject now
        // succeeds against the fresh one.
        p.stock = 10;
        cart.add_line(&p, 5).unwrap();
        let line = cart.line(&p.id).unwrap();
        assert_eq!(line.quantity, 9);
        assert_eq!(line.available_stock, 10);
    }

    #[test]
    fn add_beyond_stock_rejects_and_leaves_cart_unchanged() {
        let p = product("A-1", 1000, 600, 3);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 2).unwrap();
        let before = cart.clone();

        let err = cart.add_line(&p, 2).unwrap_err();
        assert_eq!(
            err,
            CoreError::StockExceeded {
                sku: "A-1".into(),
                requested: 4,
                available: 3,
            }
        );
        assert_eq!(cart.lines(), before.lines());
        assert_eq!(cart.totals(), before.totals());
    }

    #[test]
    fn rejects_inactive_and_foreign_branch_products() {
        let mut inactive = product("A-1", 1000, 600, 10);
        inactive.is_active = false;
        let mut foreign = product("B-1", 1000, 600, 10);
        foreign.branch_id = "branch-2".into();

        let mut cart = Cart::new("branch-1");
        assert!(matches!(
            cart.add_line(&inactive, 1),
            Err(CoreError::ProductInactive { .. })
        ));
        assert!(matches!(
            cart.add_line(&foreign, 1),
            Err(CoreError::BranchMismatch { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn line_cap_and_quantity_cap() {
        let mut cart = Cart::new("branch-1");
        for i in 0..MAX_CART_LINES {
            let p = product(&format!("SKU-{i}"), 100, 50, 5);
            cart.add_line(&p, 1).unwrap();
        }
        let overflow = product("SKU-OVER", 100, 50, 5);
        assert!(matches!(
            cart.add_line(&overflow, 1),
            Err(CoreError::CartTooLarge { .. })
        ));

        let mut cart = Cart::new("branch-1");
        let bulk = product("BULK", 100, 50, 5000);
        assert!(matches!(
            cart.add_line(&bulk, MAX_LINE_QUANTITY + 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn set_quantity_clamps_to_known_stock() {
        let p = product("A-1", 1000, 600, 5);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 1).unwrap();

        assert_eq!(cart.set_quantity(&p.id, 50).unwrap(), 5);
        assert_eq!(cart.line(&p.id).unwrap().quantity, 5);

        assert_eq!(cart.set_quantity(&p.id, 3).unwrap(), 3);
        assert_eq!(cart.line(&p.id).unwrap().quantity, 3);
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let p = product("A-1", 1000, 600, 5);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 2).unwrap();

        assert_eq!(cart.set_quantity(&p.id, 0).unwrap(), 0);
        assert!(cart.is_empty());

        assert!(matches!(
            cart.set_quantity(&p.id, 1),
            Err(CoreError::LineNotFound { .. })
        ));
    }

    #[test]
    fn remove_line_unknown_product_errors() {
        let mut cart = Cart::new("branch-1");
        assert!(matches!(
            cart.remove_line("missing"),
            Err(CoreError::LineNotFound { .. })
        ));
    }

    #[test]
    fn clear_resets_selections() {
        let p = product("A-1", 1000, 600, 5);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 2).unwrap();
        cart.select_payment_method(PaymentMethod::Card);
        cart.select_customer(Some("cust-1".into()));
        cart.set_discount(100).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.payment_method(), None);
        assert_eq!(cart.customer_id(), None);
        assert_eq!(cart.discount_cents(), 0);
    }

    #[test]
    fn discount_bounds_and_totals() {
        let p = product("A-1", 1000, 600, 10);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 2).unwrap();

        assert!(cart.set_discount(-1).is_err());
        assert!(cart.set_discount(2001).is_err());
        cart.set_discount(500).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 2000);
        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.total_cents, 1500);
        // Discount does not change line-level profit.
        assert_eq!(totals.profit_cents, 800);
    }

    #[test]
    fn discount_never_exceeds_shrunken_subtotal() {
        let p = product("A-1", 1000, 600, 10);
        let mut cart = Cart::new("branch-1");
        cart.add_line(&p, 3).unwrap();
        cart.set_discount(2500).unwrap();

        // Quantity drops after the discount was set.
        cart.set_quantity(&p.id, 1).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 1000);
        assert_eq!(totals.discount_cents, 1000);
        assert_eq!(totals.total_cents, 0);
    }
}
