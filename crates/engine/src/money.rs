use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the ledger (opening income,
/// record amounts, summary totals) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = income
/// - negative = expense
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (`.` is the only decimal separator; rejects more
/// than 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("-10.5".parse::<Money>().unwrap().cents(), -1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

/// Why a string is not a [`Money`] amount.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMoney {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount")]
    Invalid,
    #[error("too many decimals")]
    TooManyDecimals,
    #[error("amount too large")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value, saturating at `i64::MAX` cents.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Same magnitude, negative sign (zero stays zero).
    #[must_use]
    pub const fn as_expense(self) -> Self {
        Self(-self.0.saturating_abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
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

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = InvalidMoney;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` as decimal separator and an optional leading `+`/`-`.
    /// Full-width digits and signs are folded to ASCII first (NFKC).
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - digits only around the separator (rejects `1,000`, `1e3`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.trim().nfkc().collect();
        if normalized.is_empty() {
            return Err(InvalidMoney::Empty);
        }

        let (negative, rest) = if let Some(stripped) = normalized.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = normalized.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, normalized.as_str())
        };

        if rest.is_empty() {
            return Err(InvalidMoney::Empty);
        }

        let (units_str, cents_str) = match rest.split_once('.') {
            Some((units, cents)) => (units, Some(cents)),
            None => (rest, None),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidMoney::Invalid);
        }

        let units: i64 = units_str.parse().map_err(|_| InvalidMoney::Overflow)?;

        let cents: i64 = match cents_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(InvalidMoney::Invalid);
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| InvalidMoney::Invalid)? * 10,
                    2 => frac.parse::<i64>().map_err(|_| InvalidMoney::Invalid)?,
                    _ => return Err(InvalidMoney::TooManyDecimals),
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or(InvalidMoney::Overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_signs_and_decimals() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("10.".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("-0.01".parse::<Money>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_folds_full_width_digits() {
        assert_eq!("５０".parse::<Money>().unwrap().cents(), 5000);
        assert_eq!("－５".parse::<Money>().unwrap().cents(), -500);
    }

    #[test]
    fn parse_rejects_non_numbers() {
        assert_eq!("12.345".parse::<Money>(), Err(InvalidMoney::TooManyDecimals));
        assert_eq!("1,5".parse::<Money>(), Err(InvalidMoney::Invalid));
        assert_eq!("lunch".parse::<Money>(), Err(InvalidMoney::Invalid));
        assert_eq!("-".parse::<Money>(), Err(InvalidMoney::Empty));
        assert_eq!(".5".parse::<Money>(), Err(InvalidMoney::Invalid));
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn expense_sign_is_forced() {
        assert_eq!(Money::new(500).as_expense(), Money::new(-500));
        assert_eq!(Money::new(-500).as_expense(), Money::new(-500));
        assert_eq!(Money::ZERO.as_expense(), Money::ZERO);
    }
}
