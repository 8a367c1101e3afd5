//! # caja-checkout: Sale Commit Coordination
//!
//! Takes a [`caja_core::SaleDraft`] and drives it through the commit
//! sequence against a storage backend, so that a sale is either fully
//! placed or provably not placed.
//!
//! ## Commit State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Commit Attempt                               │
//! │                                                                         │
//! │  PENDING                                                                │
//! │     │  re-fetch authoritative stock, check every line                   │
//! │     ▼                                                                   │
//! │  STOCK_VALIDATED ──────────── violation ──────────► ABORTED             │
//! │     │                                               (no writes at all)  │
//! │     ▼                                                                   │
//! │  HEADER_WRITTEN      insert sale header                                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  LINES_WRITTEN       insert all lines, one batch                        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  STOCK_APPLIED       guarded decrement per product                      │
//! │     │                (UPDATE ... WHERE stock >= q, rows checked)        │
//! │     ▼                                                                   │
//! │  COMPLETED           receipt returned                                   │
//! │                                                                         │
//! │  any write failure ──► FAILED_PARTIAL ──► compensation:                 │
//! │     restore applied decrements, delete lines, delete header             │
//! │     (void the header if the delete is blocked)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs on the caller's task and can be cancelled freely; once
//! the write sequence starts it runs on a detached task, so dropping the
//! caller's future can no longer leave a half-written sale behind.
//!
//! ## Modules
//!
//! - [`coordinator`] - the state machine itself
//! - [`port`] - the [`CheckoutStore`] storage trait
//! - [`sqlite`] - adapter for [`caja_store::Store`]
//! - [`memory`] - in-memory store for tests and local development
//! - [`error`] - [`CheckoutError`] taxonomy

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod port;
pub mod sqlite;

pub use coordinator::{CommitCoordinator, CommitReceipt, CommitStage};
pub use error::{CheckoutError, CheckoutResult, StockViolation};
pub use memory::{FaultPlan, MemoryStore};
pub use port::{BackendError, CheckoutStore, DecrementOutcome, StockLevel};
