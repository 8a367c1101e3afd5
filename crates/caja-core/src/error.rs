//! Domain error types.
//!
//! Every fallible operation in this crate returns [`CoreResult`]. The
//! variants carry enough structure (SKU, requested vs. available, field
//! names) for a caller to render a useful message without parsing strings.

use thiserror::Error;

/// Result alias for core domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by cart and sale-building logic.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A sale cannot be built from a cart with no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// No payment method selected, or the supplied value is not recognised.
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// Requested quantity exceeds the stock known for the product.
    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    StockExceeded {
        sku: String,
        requested: i64,
        available: i64,
    },

    /// The product is soft-deleted and cannot be sold.
    #[error("product {sku} is inactive")]
    ProductInactive { sku: String },

    /// An entity belongs to a different branch than the one in scope.
    #[error("branch mismatch for {entity}: expected {expected}, found {found}")]
    BranchMismatch {
        entity: String,
        expected: String,
        found: String,
    },

    /// The cart holds no line for the given product.
    #[error("no cart line for product {product_id}")]
    LineNotFound { product_id: String },

    /// Adding another line would exceed the cart line limit.
    #[error("cart cannot hold more than {max} lines")]
    CartTooLarge { max: usize },

    /// A single line quantity exceeds the per-line limit.
    #[error("quantity {requested} exceeds per-line limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Field-level validation failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_exceeded_message_carries_numbers() {
        let err = CoreError::StockExceeded {
            sku: "CAFE-500".into(),
            requested: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for CAFE-500: requested 5, available 2"
        );
    }

    #[test]
    fn validation_converts_into_core_error() {
        let v = ValidationError::Required {
            field: "sku".into(),
        };
        let core: CoreError = v.into();
        assert_eq!(core.to_string(), "sku is required");
    }

    #[test]
    fn branch_mismatch_message() {
        let err = CoreError::BranchMismatch {
            entity: "cart".into(),
            expected: "branch-1".into(),
            found: "branch-2".into(),
        };
        assert_eq!(
            err.to_string(),
            "branch mismatch for cart: expected branch-1, found branch-2"
        );
    }
}
