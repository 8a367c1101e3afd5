//! Core domain types shared across every Caja crate.
//!
//! These structs mirror the SQLite schema one-to-one. IDs are UUIDs stored
//! as TEXT, timestamps are UTC, and every monetary column is integer cents
//! (see [`crate::money::Money`]).

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    /// All accepted methods, in display order.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(CoreError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Lifecycle state of a committed sale.
///
/// A voided sale keeps its header and lines for audit; only the status flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum SaleStatus {
    Completed,
    Voided,
}

/// Lifecycle state of a supplier purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum PurchaseStatus {
    /// Ordered but not yet received; stock is untouched.
    Pending,
    /// Goods received and stock incremented.
    Completed,
}

// =============================================================================
// Session
// =============================================================================

/// Who is selling, and from which branch.
///
/// Every cart and every committed sale is scoped to the session's branch.
/// There is no ambient "current branch" global anywhere in the system; the
/// session travels explicitly through every call that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub branch_id: String,
    pub opened_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, branch_id: impl Into<String>) -> CoreResult<Self> {
        let user_id = user_id.into();
        let branch_id = branch_id.into();
        if user_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "user_id".into(),
            }
            .into());
        }
        if branch_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "branch_id".into(),
            }
            .into());
        }
        Ok(Self {
            user_id,
            branch_id,
            opened_at: Utc::now(),
        })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product as persisted.
///
/// `stock` is the on-hand unit count and is never negative; the database
/// enforces this with a CHECK constraint, and the conditional decrement in
/// the checkout path never lets it go below zero either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub branch_id: String,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub cost_cents: i64,
    pub price_cents: i64,
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub units_sold: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product. IDs and timestamps are generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub branch_id: String,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub cost_cents: i64,
    pub price_cents: i64,
    pub stock: i64,
    pub low_stock_threshold: i64,
}

impl Product {
    /// Validates the input and builds a new active product.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use caja_core::{NewProduct, Product};
    ///
    /// let p = Product::new(NewProduct {
    ///     branch_id: "branch-1".into(),
    ///     sku: "ARROZ-1KG".into(),
    ///     name: "Arroz Extra 1kg".into(),
    ///     brand: Some("Costeño".into()),
    ///     category: Some("Abarrotes".into()),
    ///     cost_cents: 350,
    ///     price_cents: 500,
    ///     stock: 40,
    ///     low_stock_threshold: 10,
    /// }).unwrap();
    /// assert!(p.is_active);
    /// assert_eq!(p.units_sold, 0);
    /// ```
    pub fn new(input: NewProduct) -> CoreResult<Self> {
        if input.branch_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "branch_id".into(),
            }
            .into());
        }
        let sku = validation::validate_sku(&input.sku)?;
        let name = validation::validate_product_name(&input.name)?;
        validation::validate_price_cents("price_cents", input.price_cents)?;
        validation::validate_price_cents("cost_cents", input.cost_cents)?;
        if input.stock < 0 {
            return Err(ValidationError::MustBePositive {
                field: "stock".into(),
            }
            .into());
        }
        if input.low_stock_threshold < 0 {
            return Err(ValidationError::MustBePositive {
                field: "low_stock_threshold".into(),
            }
            .into());
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            branch_id: input.branch_id,
            sku,
            name,
            brand: input.brand,
            category: input.category,
            cost_cents: input.cost_cents,
            price_cents: input.price_cents,
            stock: input.stock,
            low_stock_threshold: input.low_stock_threshold,
            units_sold: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// True when on-hand stock has fallen to the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.is_active && self.stock <= self.low_stock_threshold
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Persisted sale header. One row per committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleHeader {
    pub id: String,
    pub branch_id: String,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub profit_cents: i64,
    /// Total units across all lines, not the number of lines.
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Persisted sale line.
///
/// `sku_snapshot` and `name_snapshot` copy the product's identity at sale
/// time so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    /// 1-based position within the sale, matching cart order.
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
    pub profit_cents: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer. Sales may optionally reference one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(branch_id: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let branch_id = branch_id.into();
        let name = name.into();
        if branch_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "branch_id".into(),
            }
            .into());
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".into(),
            }
            .into());
        }
        if name.len() > 200 {
            return Err(ValidationError::TooLong {
                field: "name".into(),
                max: 200,
            }
            .into());
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            branch_id,
            name,
            document: None,
            phone: None,
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A supplier purchase order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: String,
    pub branch_id: String,
    pub supplier: String,
    pub status: PurchaseStatus,
    pub total_cents: i64,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

/// A line on a supplier purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLine {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
}

/// An in-memory purchase under construction, before persistence.
///
/// Stock is NOT touched while the draft is built or even when it is saved;
/// on-hand counts only move when the goods are actually received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDraft {
    pub purchase: Purchase,
    pub lines: Vec<PurchaseLine>,
}

impl PurchaseDraft {
    pub fn new(branch_id: impl Into<String>, supplier: impl Into<String>) -> CoreResult<Self> {
        let branch_id = branch_id.into();
        let supplier = supplier.into();
        if branch_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "branch_id".into(),
            }
            .into());
        }
        let supplier = supplier.trim().to_string();
        if supplier.is_empty() {
            return Err(ValidationError::Required {
                field: "supplier".into(),
            }
            .into());
        }

        Ok(Self {
            purchase: Purchase {
                id: Uuid::new_v4().to_string(),
                branch_id,
                supplier,
                status: PurchaseStatus::Pending,
                total_cents: 0,
                item_count: 0,
                created_at: Utc::now(),
                received_at: None,
            },
            lines: Vec::new(),
        })
    }

    /// Adds a line for `quantity` units at the given cost, updating totals.
    pub fn add_line(
        &mut self,
        product: &Product,
        quantity: i64,
        unit_cost_cents: i64,
    ) -> CoreResult<()> {
        if product.branch_id != self.purchase.branch_id {
            return Err(CoreError::BranchMismatch {
                entity: product.sku.clone(),
                expected: self.purchase.branch_id.clone(),
                found: product.branch_id.clone(),
            });
        }
        validation::validate_quantity(quantity)?;
        validation::validate_price_cents("unit_cost_cents", unit_cost_cents)?;

        let line_total = Money::from_cents(unit_cost_cents).multiply_quantity(quantity);
        self.lines.push(PurchaseLine {
            id: Uuid::new_v4().to_string(),
            purchase_id: self.purchase.id.clone(),
            product_id: product.id.clone(),
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            quantity,
            unit_cost_cents,
            line_total_cents: line_total.cents(),
        });
        self.purchase.total_cents += line_total.cents();
        self.purchase.item_count += quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(branch: &str) -> Product {
        Product::new(NewProduct {
            branch_id: branch.into(),
            sku: "CAFE-500".into(),
            name: "Café Molido 500g".into(),
            brand: Some("Altura".into()),
            category: Some("Abarrotes".into()),
            cost_cents: 7000,
            price_cents: 10000,
            stock: 12,
            low_stock_threshold: 3,
        })
        .unwrap()
    }

    #[test]
    fn payment_method_round_trip() {
        for method in PaymentMethod::ALL {
            let parsed: PaymentMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert_eq!("  CARD ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
    }

    #[test]
    fn payment_method_rejects_unknown() {
        let err = "bitcoin".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentMethod(ref s) if s == "bitcoin"));
    }

    #[test]
    fn session_requires_user_and_branch() {
        assert!(Session::new("user-1", "branch-1").is_ok());
        assert!(Session::new("", "branch-1").is_err());
        assert!(Session::new("user-1", "  ").is_err());
    }

    #[test]
    fn product_new_generates_identity() {
        let p = sample_product("branch-1");
        assert!(!p.id.is_empty());
        assert!(p.is_active);
        assert_eq!(p.units_sold, 0);
        assert_eq!(p.price(), Money::from_cents(10000));
        assert_eq!(p.cost(), Money::from_cents(7000));
    }

    #[test]
    fn product_new_rejects_bad_input() {
        let mut bad = NewProduct {
            branch_id: "branch-1".into(),
            sku: "OK-1".into(),
            name: "Ok".into(),
            brand: None,
            category: None,
            cost_cents: 100,
            price_cents: 200,
            stock: 1,
            low_stock_threshold: 0,
        };

        bad.price_cents = -1;
        assert!(Product::new(bad.clone()).is_err());
        bad.price_cents = 200;

        bad.stock = -5;
        assert!(Product::new(bad.clone()).is_err());
        bad.stock = 1;

        bad.sku = "".into();
        assert!(Product::new(bad).is_err());
    }

    #[test]
    fn low_stock_respects_threshold_and_active_flag() {
        let mut p = sample_product("branch-1");
        assert!(!p.is_low_stock());
        p.stock = 3;
        assert!(p.is_low_stock());
        p.is_active = false;
        assert!(!p.is_low_stock());
    }

    #[test]
    fn purchase_draft_accumulates_totals() {
        let p = sample_product("branch-1");
        let mut draft = PurchaseDraft::new("branch-1", "Distribuidora Norte").unwrap();
        draft.add_line(&p, 10, 6500).unwrap();
        draft.add_line(&p, 5, 6800).unwrap();

        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.purchase.item_count, 15);
        assert_eq!(draft.purchase.total_cents, 10 * 6500 + 5 * 6800);
        assert_eq!(draft.purchase.status, PurchaseStatus::Pending);
        assert!(draft.purchase.received_at.is_none());
    }

    #[test]
    fn purchase_draft_rejects_foreign_branch() {
        let p = sample_product("branch-2");
        let mut draft = PurchaseDraft::new("branch-1", "Distribuidora Norte").unwrap();
        let err = draft.add_line(&p, 1, 100).unwrap_err();
        assert!(matches!(err, CoreError::BranchMismatch { .. }));
        assert!(draft.lines.is_empty());
    }
}
