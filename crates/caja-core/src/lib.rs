//! # caja-core: Pure Business Logic for Caja
//!
//! This crate is the heart of the Caja point-of-sale system. It contains the
//! sale-transaction business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Caja Sale Flow                               │
//! │                                                                     │
//! │  caja-store ──► catalog snapshot (Vec<Product>)                     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ★ caja-core (THIS CRATE) ★                                         │
//! │                                                                     │
//! │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐          │
//! │   │  types   │  │  money   │  │   cart   │  │  builder   │          │
//! │   │ Product  │  │  Money   │  │   Cart   │  │ build_sale │          │
//! │   │ Session  │  │  cents   │  │ CartLine │  │ SaleDraft  │          │
//! │   └──────────┘  └──────────┘  └──────────┘  └────────────┘          │
//! │                                                                     │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  caja-checkout ──► commit SaleDraft through the state machine       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SaleHeader, Session, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart aggregator with stock ceilings and frozen prices
//! - [`builder`] - Pure cart → sale-draft construction
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::{build_sale, Cart, Money, NewProduct, PaymentMethod, Product, Session};
//!
//! let session = Session::new("user-1", "branch-1").unwrap();
//! let product = Product::new(NewProduct {
//!     branch_id: "branch-1".into(),
//!     sku: "CAFE-500".into(),
//!     name: "Café Molido 500g".into(),
//!     brand: None,
//!     category: Some("Abarrotes".into()),
//!     cost_cents: 7000,
//!     price_cents: 10000,
//!     stock: 12,
//!     low_stock_threshold: 3,
//! })
//! .unwrap();
//!
//! let mut cart = Cart::for_session(&session);
//! cart.add_line(&product, 2).unwrap();
//! cart.select_payment_method(PaymentMethod::Cash);
//!
//! let draft = build_sale(&cart, &session).unwrap();
//! assert_eq!(draft.header.total_cents, 20000);
//! assert_eq!(Money::from_cents(draft.header.profit_cents), Money::from_cents(6000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod builder;
pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use caja_core::Money` instead of
// `use caja_core::money::Money`

pub use builder::{build_sale, SaleDraft};
pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct product lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// Catches obvious typos (1000 instead of 10) before the stock ceiling does.
pub const MAX_LINE_QUANTITY: i64 = 999;
