//! Rupee amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in Indian rupees.
///
/// The backend sends plain JSON numbers; they are held as [`Decimal`] so
/// totals never accumulate float error.
///
/// ```
/// use marketplace_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(129_950, 2));
/// assert_eq!(price.to_string(), "₹1299.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole rupees.
    #[must_use]
    pub fn rupees(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        if rounded.fract().is_zero() {
            write!(f, "₹{}", rounded.trunc())
        } else {
            write!(f, "₹{rounded:.2}")
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_and_fractional() {
        assert_eq!(Price::rupees(499).to_string(), "₹499");
        assert_eq!(Price::new(Decimal::new(4995, 1)).to_string(), "₹499.50");
    }

    #[test]
    fn test_line_totals() {
        let total: Price = [Price::rupees(250) * 2, Price::rupees(99)].into_iter().sum();
        assert_eq!(total, Price::rupees(599));
    }

    #[test]
    fn test_deserializes_json_numbers() {
        let price: Price = serde_json::from_str("1299").unwrap();
        assert_eq!(price, Price::rupees(1299));
        let price: Price = serde_json::from_str("49.5").unwrap();
        assert_eq!(price.to_string(), "₹49.50");
    }
}
