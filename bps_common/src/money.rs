use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "USD";

//--------------------------------------       Money         ---------------------------------------------------------
/// A fixed-point currency amount, stored as an integer number of cents.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies the amount by a whole percentage, rounding half-up to the nearest cent.
    /// The amount must be non-negative.
    pub fn percent(&self, pct: i64) -> Self {
        Self((self.0 * pct + 50).div_euclid(100))
    }

    /// Multiplies the amount by a rate expressed in basis points (1/100th of a percent),
    /// rounding half-up to the nearest cent. The amount must be non-negative.
    pub fn basis_points(&self, bps: i64) -> Self {
        Self((self.0 * bps + 5_000).div_euclid(10_000))
    }

    /// Clamps the amount to the closed range `[Money::ZERO, max]`.
    pub fn clamp_to(&self, max: Money) -> Self {
        Self(self.0.clamp(0, max.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Money::from_cents(2550).to_string(), "$25.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn percent_rounds_half_up() {
        // 20% of $25.00 is exactly $5.00
        assert_eq!(Money::from_cents(2500).percent(20), Money::from_cents(500));
        // 15% of $0.03 = 0.45c, rounds to 0
        assert_eq!(Money::from_cents(3).percent(15), Money::from_cents(0));
        // 50% of $0.03 = 1.5c, rounds up to 2c
        assert_eq!(Money::from_cents(3).percent(50), Money::from_cents(2));
        assert_eq!(Money::from_cents(2500).percent(100), Money::from_cents(2500));
    }

    #[test]
    fn basis_points_rounds_half_up() {
        // 10% of $20.00
        assert_eq!(Money::from_cents(2000).basis_points(1000), Money::from_cents(200));
        // 8.25% of $19.99 = 164.9175c -> 165c
        assert_eq!(Money::from_cents(1999).basis_points(825), Money::from_cents(165));
        // 0.5c exactly rounds up: 0.01% of $50.00 = 0.5c -> 1c
        assert_eq!(Money::from_cents(5000).basis_points(1), Money::from_cents(1));
    }

    #[test]
    fn clamping() {
        let subtotal = Money::from_cents(1000);
        assert_eq!(Money::from_cents(1500).clamp_to(subtotal), subtotal);
        assert_eq!(Money::from_cents(-10).clamp_to(subtotal), Money::ZERO);
        assert_eq!(Money::from_cents(999).clamp_to(subtotal), Money::from_cents(999));
    }

    #[test]
    fn sums() {
        let total: Money = [1000, 500, 550].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(2050));
    }
}
