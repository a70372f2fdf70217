//! Monetary amounts.

use serde::{Deserialize, Serialize};

/// Money amount in the smallest currency unit.
///
/// All pricing arithmetic is integral; percentages are floored. The operator
/// impls saturate at the `i64` bounds; pricing goes through the `checked_*`
/// methods so an out-of-range order is rejected instead of clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new Money amount from minor units.
    pub const fn from_minor(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts an amount, or `None` on overflow.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Returns `percent`% of this amount rounded down, or `None` if the
    /// result does not fit.
    pub fn checked_percent(&self, percent: u32) -> Option<Money> {
        let scaled = (i128::from(self.0) * i128::from(percent)).div_euclid(100);
        i64::try_from(scaled).ok().map(Money)
    }

    /// Returns `percent`% of this amount, rounded down. Never overflows for
    /// `percent <= 100`; larger rates saturate.
    pub fn percent(&self, percent: u32) -> Money {
        self.checked_percent(percent).unwrap_or(if self.0 < 0 {
            Money(i64::MIN)
        } else {
            Money(i64::MAX)
        })
    }

    /// Returns the smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).amount(), 1500);
        assert_eq!((a - b).amount(), 500);
        assert_eq!(a.checked_multiply(3), Some(Money::from_minor(3000)));
    }

    #[test]
    fn test_checked_arithmetic_detects_overflow() {
        let huge = Money::from_minor(4_000_000_000_000_000_000);
        assert_eq!(huge.checked_multiply(3), None);
        assert_eq!(huge.checked_multiply(2), Some(Money::from_minor(8_000_000_000_000_000_000)));
        assert_eq!(huge.checked_add(huge.checked_multiply(2).unwrap()), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
        assert_eq!(
            Money::from_minor(i64::MAX).checked_percent(10),
            Some(Money::from_minor(i64::MAX / 10))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_percent(200), None);
    }

    #[test]
    fn test_operators_saturate() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max + Money::from_minor(1), max);
        assert_eq!(Money::from_minor(i64::MIN) - Money::from_minor(1), Money::from_minor(i64::MIN));

        let total: Money = [max, max].into_iter().sum();
        assert_eq!(total, max);
        assert_eq!(max.percent(100), max);
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(Money::from_minor(4000).percent(10).amount(), 400);
        assert_eq!(Money::from_minor(999).percent(10).amount(), 99);
        assert_eq!(Money::from_minor(5).percent(20).amount(), 1);
        assert_eq!(Money::from_minor(1234).percent(0).amount(), 0);
    }

    #[test]
    fn test_money_display_is_plain_amount() {
        assert_eq!(Money::from_minor(4900).to_string(), "4900");
        assert_eq!(Money::from_minor(-15).to_string(), "-15");
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_minor).sum();
        assert_eq!(total.amount(), 1000);
    }

    #[test]
    fn test_money_comparison() {
        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(0).is_zero());
        assert!(Money::from_minor(-100).is_negative());
        assert_eq!(Money::from_minor(300).min(Money::from_minor(200)).amount(), 200);
    }

    #[test]
    fn test_money_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_minor(5500)).unwrap();
        assert_eq!(json, "5500");
    }
}
