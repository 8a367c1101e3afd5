//! # Repositories
//!
//! One repository per aggregate. Each holds a cheap clone of the pool and
//! exposes the queries the rest of the workspace needs.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Store                                                           │
//! │    ├── products()   → ProductRepository   (catalog + stock)      │
//! │    ├── sales()      → SaleRepository      (headers + lines)      │
//! │    ├── customers()  → CustomerRepository                         │
//! │    ├── purchases()  → PurchaseRepository  (supplier orders)      │
//! │    └── reports()    → ReportRepository    (read-only summaries)  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;

pub use customer::CustomerRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;
pub use report::ReportRepository;
pub use sale::SaleRepository;
