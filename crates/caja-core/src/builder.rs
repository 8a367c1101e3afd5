//! Sale transaction builder.
//!
//! Turns a cart plus a session into a [`SaleDraft`]: the exact header and
//! line rows a commit will write, fully priced and numbered, before any
//! I/O happens. Building a draft never touches stock; that is the commit
//! coordinator's job.

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::types::{SaleHeader, SaleLine, SaleStatus, Session};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fully-formed sale ready to be committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub header: SaleHeader,
    pub lines: Vec<SaleLine>,
}

impl SaleDraft {
    pub fn sale_id(&self) -> &str {
        &self.header.id
    }
}

/// Builds a sale draft from the cart.
///
/// Pure apart from the generated ids and timestamp. Fails with
/// [`CoreError::EmptyCart`] on an empty cart, with
/// [`CoreError::InvalidPaymentMethod`] when no payment method has been
/// selected, and with [`CoreError::BranchMismatch`] when the cart was not
/// opened for the session's branch.
///
/// ## Example
///
/// ```rust,ignore
/// let draft = build_sale(&cart, &session)?;
/// let receipt = coordinator.commit(draft).await?;
/// ```
pub fn build_sale(cart: &Cart, session: &Session) -> CoreResult<SaleDraft> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    let payment_method = cart
        .payment_method()
        .ok_or_else(|| CoreError::InvalidPaymentMethod("no payment method selected".into()))?;
    if cart.branch_id() != session.branch_id {
        return Err(CoreError::BranchMismatch {
            entity: "cart".into(),
            expected: session.branch_id.clone(),
            found: cart.branch_id().to_string(),
        });
    }

    let totals = cart.totals();
    let sale_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let header = SaleHeader {
        id: sale_id.clone(),
        branch_id: session.branch_id.clone(),
        user_id: session.user_id.clone(),
        customer_id: cart.customer_id().map(str::to_string),
        payment_method,
        status: SaleStatus::Completed,
        subtotal_cents: totals.subtotal_cents,
        discount_cents: totals.discount_cents,
        total_cents: totals.total_cents,
        profit_cents: totals.profit_cents,
        item_count: totals.total_quantity,
        created_at: now,
    };

    let lines = cart
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| SaleLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            sku_snapshot: line.sku.clone(),
            name_snapshot: line.name.clone(),
            line_no: (i + 1) as i64,
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            unit_cost_cents: line.unit_cost_cents,
            line_total_cents: line.line_total().cents(),
            profit_cents: line.line_profit().cents(),
        })
        .collect();

    Ok(SaleDraft { header, lines })
}
