//! Money type backed by integer cents.
//!
//! All monetary amounts in Caja are stored and computed as `i64` cents.
//! Floating point never touches a price, a total, or a profit figure.
//!
//! ## Example
//!
//! ```rust
//! use caja_core::Money;
//!
//! let price = Money::from_cents(10000); // $100.00
//! let total = price.multiply_quantity(3);
//! assert_eq!(total, Money::from_cents(30000));
//! assert_eq!(total.to_string(), "$300.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A monetary amount in integer cents.
///
/// Negative values are allowed; profit on a below-cost sale is negative
/// and compensation math relies on plain integer subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a `Money` from an amount in cents.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use caja_core::Money;
    /// let m = Money::from_cents(2550); // $25.50
    /// assert_eq!(m.cents(), 2550);
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the raw amount in cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is greater than zero.
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is less than zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Multiplies a unit amount by a line quantity. Saturates on overflow.
    pub const fn multiply_quantity(&self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let major = (self.0 / 100).abs();
        let minor = (self.0 % 100).abs();
        write!(f, "{}${}.{:02}", sign, major, minor)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Mul<i64> for Money {
    type Output = Money;
    fn mul(self, rhs: i64) -> Money {
        self.multiply_quantity(rhs)
    }
}
