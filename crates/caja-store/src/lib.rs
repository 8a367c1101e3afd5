//! # caja-store: Storage Layer for Caja
//!
//! SQLite persistence for the Caja point-of-sale system: connection pool,
//! embedded migrations, and the repositories the rest of the workspace
//! talks to.
//!
//! ## Layout
//!
//! - [`pool`] - [`Store`] handle and [`StoreConfig`]
//! - [`migrations`] - embedded schema migrations
//! - [`repository`] - one repository per aggregate (products, sales,
//!   customers, purchases, reports)
//! - [`error`] - [`StoreError`] and the sqlx error mapping
//!
//! ## Example
//!
//! ```rust,ignore
//! let store = Store::new(StoreConfig::new("./caja.db")).await?;
//! let snapshot = store.products().snapshot("branch-1").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use pool::{Store, StoreConfig};
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::report::{PaymentBucket, PurchasesSummary, ReportRepository, SalesSummary};
pub use repository::sale::SaleRepository;
