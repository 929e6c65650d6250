use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use anyhow::{bail, Context};

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally as an integer number of cents, so totals
/// are exact no matter how many line items are summed. The [`Display`]
/// implementation formats it as dollars to 2 decimal places.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Usd(i64);

impl Usd {
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub fn cents(self) -> i64 {
        self.0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.as_f64();
        write!(f, "{dollars:>12.2}")
    }
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    /// Parses amounts such as `12`, `12.5`, `-3.99`, `$1,204.10`.
    ///
    /// More than two decimal places are rounded to the nearest cent. Amounts
    /// whose cent value does not fit in an `i64` are rejected.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let cleaned = s.trim().replace([',', '$'], "");
        if cleaned.is_empty() {
            bail!("empty amount");
        }
        let value: f64 = cleaned
            .parse()
            .with_context(|| format!("invalid amount {s:?}"))?;
        if !value.is_finite() {
            bail!("invalid amount {s:?}");
        }
        let cents = (value * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, so the end bound is exclusive
        if !(i64::MIN as f64..i64::MAX as f64).contains(&cents) {
            bail!("amount {s:?} out of range");
        }
        Ok(Self(cents as i64))
    }
}

/// # Panics
///
/// If the sum overflows. Use [`Usd::checked_add`] for totals built from
/// input data.
impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_parses_plain_and_decimal_amounts() {
        assert_eq!(Usd::from_str("10").unwrap(), Usd::from_cents(1000));
        assert_eq!(Usd::from_str("10.0").unwrap(), Usd::from_cents(1000));
        assert_eq!(Usd::from_str("3.5").unwrap(), Usd::from_cents(350));
        assert_eq!(Usd::from_str("-2.99").unwrap(), Usd::from_cents(-299));
    }

    #[test]
    fn from_str_fn_strips_thousands_separators_and_dollar_sign() {
        assert_eq!(Usd::from_str("$3,409.15").unwrap(), Usd::from_cents(340_915));
    }

    #[test]
    fn from_str_fn_rounds_extra_decimal_places() {
        assert_eq!(Usd::from_str("1.237").unwrap().cents(), 124);
    }

    #[test]
    fn from_str_fn_rejects_garbage() {
        assert!(Usd::from_str("").is_err());
        assert!(Usd::from_str("ten").is_err());
        assert!(Usd::from_str("NaN").is_err());
    }

    #[test]
    fn from_str_fn_rejects_amounts_beyond_cent_range() {
        assert!(Usd::from_str("1e17").is_err());
        assert!(Usd::from_str("-1e17").is_err());
        assert!(Usd::from_str("1e16").is_ok());
    }

    #[test]
    fn checked_add_fn_reports_overflow() {
        let big = Usd::from_str("90000000000000000").unwrap();
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            Usd::from_cents(1).checked_add(Usd::from_cents(2)),
            Some(Usd::from_cents(3))
        );
    }

    #[test]
    fn sum_of_amounts_is_exact() {
        let total: Usd = std::iter::repeat(Usd::from_str("0.1").unwrap())
            .take(10)
            .sum();
        assert_eq!(total, Usd::from_cents(100));
        assert!((total.as_f64() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_formats_as_right_aligned_dollars() {
        assert_eq!(Usd::from_cents(25000).to_string(), "      250.00");
    }
}
