//! Checkout error taxonomy.
//!
//! Callers branch on these variants to decide what the cashier sees:
//! a fixable cart problem, a stock conflict with the exact lines named,
//! or a commit that needs attention. [`CheckoutError::is_retryable`]
//! encodes which failures are safe to simply try again.

use caja_core::CoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::coordinator::CommitStage;

/// Result alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// One cart line that failed commit-time stock validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockViolation {
    pub product_id: String,
    pub sku: String,
    pub requested: i64,
    pub available: i64,
}

impl fmt::Display for StockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: requested {}, available {}",
            self.sku, self.requested, self.available
        )
    }
}

/// Errors produced while committing a sale.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The draft itself is invalid (empty, wrong branch, bad payment
    /// method). Nothing was attempted against storage.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// Commit-time stock validation failed, or a guarded decrement lost a
    /// race and was fully compensated. Every violating line is listed.
    /// No sale was placed.
    #[error("insufficient stock for {} line(s)", .violations.len())]
    StockExceeded { violations: Vec<StockViolation> },

    /// A write step failed partway. `compensated` reports whether the
    /// cleanup fully restored previous state; when it is `false` the
    /// sale rows or stock need manual attention. The sale must be
    /// treated as not placed either way.
    #[error("commit failed during {stage} for sale {sale_id}: {reason} (compensated: {compensated})")]
    CommitIncomplete {
        sale_id: String,
        stage: CommitStage,
        compensated: bool,
        reason: String,
    },

    /// The backend could not be reached (or timed out) before any write
    /// happened. Nothing was placed; retry freely.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// This coordinator is already committing a sale.
    #[error("a commit is already in flight for this session")]
    CommitInFlight,

    /// Task or runtime failure outside the commit sequence proper.
    #[error("internal checkout error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// True when retrying the same draft is safe and sensible.
    ///
    /// A compensated partial failure left storage as if the attempt never
    /// happened, so it is retryable; an uncompensated one is not, and
    /// stock conflicts need a new cart, not a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::BackendUnavailable(_) => true,
            CheckoutError::CommitInFlight => true,
            CheckoutError::CommitIncomplete { compensated, .. } => *compensated,
            CheckoutError::Invalid(_)
            | CheckoutError::StockExceeded { .. }
            | CheckoutError::Internal(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_exceeded_names_line_count() {
        let err = CheckoutError::StockExceeded {
            violations: vec![
                StockViolation {
                    product_id: "p1".into(),
                    sku: "A-1".into(),
                    requested: 5,
                    available: 2,
                },
                StockViolation {
                    product_id: "p2".into(),
                    sku: "B-1".into(),
                    requested: 1,
                    available: 0,
                },
            ],
        };
        assert_eq!(err.to_string(), "insufficient stock for 2 line(s)");
        assert!(!err.is_retryable());
    }

    #[test]
    fn violation_display() {
        let v = StockViolation {
            product_id: "p1".into(),
            sku: "A-1".into(),
            requested: 5,
            available: 2,
        };
        assert_eq!(v.to_string(), "A-1: requested 5, available 2");
    }

    #[test]
    fn retryability() {
        assert!(CheckoutError::BackendUnavailable("down".into()).is_retryable());
        assert!(CheckoutError::CommitInFlight.is_retryable());
        assert!(CheckoutError::CommitIncomplete {
            sale_id: "s".into(),
            stage: CommitStage::StockApplied,
            compensated: true,
            reason: "x".into(),
        }
        .is_retryable());
        assert!(!CheckoutError::CommitIncomplete {
            sale_id: "s".into(),
            stage: CommitStage::StockApplied,
            compensated: false,
            reason: "x".into(),
        }
        .is_retryable());
        assert!(!CheckoutError::Invalid(CoreError::EmptyCart).is_retryable());
    }
}
