//! Input validation rules.
//!
//! Validators trim and return the cleaned value where the input is text,
//! so callers store exactly what was validated.

use crate::error::{CoreResult, ValidationError};
use crate::MAX_LINE_QUANTITY;

/// Maximum SKU length in characters.
pub const MAX_SKU_LENGTH: usize = 50;

/// Maximum product name length in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum search query length in characters.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Validates a SKU: non-empty, at most 50 characters, and limited to
/// alphanumerics, `-` and `_`.
pub fn validate_sku(sku: &str) -> CoreResult<String> {
    let sku = sku.trim();
    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".into(),
        }
        .into());
    }
    if sku.len() > MAX_SKU_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sku".into(),
            max: MAX_SKU_LENGTH,
        }
        .into());
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".into(),
            reason: "only letters, digits, '-' and '_' are allowed".into(),
        }
        .into());
    }
    Ok(sku.to_string())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".into(),
        }
        .into());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".into(),
            max: MAX_NAME_LENGTH,
        }
        .into());
    }
    Ok(name.to_string())
}

/// Validates a line quantity: between 1 and [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if quantity < 1 || quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".into(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        }
        .into());
    }
    Ok(())
}

/// Validates a monetary amount in cents: zero or greater.
pub fn validate_price_cents(field: &str, cents: i64) -> CoreResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: field.into(),
        }
        .into());
    }
    Ok(())
}

/// Validates a catalog search query: non-empty, at most 100 characters.
pub fn validate_search_query(query: &str) -> CoreResult<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "query".into(),
        }
        .into());
    }
    if query.len() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".into(),
            max: MAX_SEARCH_LENGTH,
        }
        .into());
    }
    Ok(query.to_string())
}

/// Validates a cart-level discount against the cart subtotal.
pub fn validate_discount(discount_cents: i64, subtotal_cents: i64) -> CoreResult<()> {
    if discount_cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "discount_cents".into(),
        }
        .into());
    }
    if discount_cents > subtotal_cents {
        return Err(ValidationError::OutOfRange {
            field: "discount_cents".into(),
            min: 0,
            max: subtotal_cents,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_rules() {
        assert_eq!(validate_sku("  CAFE-500 ").unwrap(), "CAFE-500");
        assert_eq!(validate_sku("a_b_1").unwrap(), "a_b_1");
        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku("ñandú").is_err());
        assert!(validate_sku(&"X".repeat(51)).is_err());
    }

    #[test]
    fn name_rules() {
        assert_eq!(validate_product_name(" Café ").unwrap(), "Café");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"n".repeat(201)).is_err());
    }

    #[test]
    fn quantity_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn price_rules() {
        assert!(validate_price_cents("price_cents", 0).is_ok());
        assert!(validate_price_cents("price_cents", 100).is_ok());
        assert!(validate_price_cents("price_cents", -1).is_err());
    }

    #[test]
    fn search_rules() {
        assert_eq!(validate_search_query(" arroz ").unwrap(), "arroz");
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn discount_rules() {
        assert!(validate_discount(0, 1000).is_ok());
        assert!(validate_discount(1000, 1000).is_ok());
        assert!(validate_discount(-1, 1000).is_err());
        assert!(validate_discount(1001, 1000).is_err());
    }
}
