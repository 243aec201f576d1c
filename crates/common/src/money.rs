//! Money amounts in integer cents.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Money amount represented in cents to avoid floating point issues.
///
/// Serializes as the bare number of cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents.checked_mul(i64::from(quantity)).map(Money::from_cents)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Sums amounts, or `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

/// Error returned when a decimal string is not a valid amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount {input:?}: {reason}")]
pub struct ParseMoneyError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses `"10"`, `"10.5"` or `"10.50"` into cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseMoneyError {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(err("empty"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err("not a decimal number"));
        }
        if frac.len() > 2 {
            return Err(err("more than two fractional digits"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err("out of range"))?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err("out of range"))? * 10,
            _ => frac.parse().map_err(|_| err("out of range"))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| err("out of range"))?;

        Ok(Money::from_cents(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_splits_parts() {
        let money = Money::from_cents(1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn multiply_and_sum() {
        let total = Money::checked_sum([
            Money::from_cents(1000).checked_mul(2).unwrap(),
            Money::from_cents(500),
        ]);
        assert_eq!(total, Some(Money::from_cents(2500)));
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::zero()));
    }

    #[test]
    fn arithmetic_overflow_is_none() {
        assert_eq!(Money::from_cents(3_000_000_000).checked_mul(u32::MAX), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]),
            None
        );
        assert_eq!(
            Money::from_cents(i64::MAX / 2).checked_mul(2),
            Some(Money::from_cents(i64::MAX - 1))
        );
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::from_cents(1000));
        assert_eq!("10.5".parse::<Money>().unwrap(), Money::from_cents(1050));
        assert_eq!("10.05".parse::<Money>().unwrap(), Money::from_cents(1005));
        assert_eq!(".99".parse::<Money>().unwrap(), Money::from_cents(99));
        assert_eq!(" 7.00 ".parse::<Money>().unwrap(), Money::from_cents(700));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("1e3".parse::<Money>().is_err());
    }

    #[test]
    fn serializes_as_cents() {
        assert_eq!(serde_json::to_string(&Money::from_cents(999)).unwrap(), "999");
    }
}
