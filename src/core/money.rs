//! Exact decimal amounts used for entry amounts and account balances.
//!
//! [`Amount`] wraps a [`bigdecimal::BigDecimal`] limited to [`SCALE`] fractional digits and at
//! most [`MAX_INTEGER_DIGITS`] integer digits. Arithmetic is arbitrary precision, so every sum and
//! difference is exact; results that leave the range are rejected rather than stored. Amounts are
//! persisted as canonical fixed-scale text so the SQLite driver never routes them through `f64`.

use crate::errors::{Error, Result};
use bigdecimal::{BigDecimal, Signed, Zero};
use sea_orm::sea_query::{ArrayType, ColumnType, Value, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, DbErr, QueryResult, TryGetError, TryGetable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Number of fractional digits carried by every amount and balance.
pub const SCALE: i64 = 18;

/// Largest number of integer digits an amount may carry.
pub const MAX_INTEGER_DIGITS: i64 = 12;

/// 10^12, the exclusive bound on the magnitude of any amount.
fn magnitude_limit() -> BigDecimal {
    BigDecimal::from(1_000_000_000_000_u64)
}

/// A signed exact decimal amount.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BigDecimal", into = "BigDecimal")]
pub struct Amount(BigDecimal);

impl Amount {
    /// The zero amount; new accounts start here.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    /// Validates a decimal and wraps it.
    ///
    /// Rejects values with more than [`SCALE`] significant fractional digits or with a magnitude
    /// of 10^[`MAX_INTEGER_DIGITS`] or more.
    pub fn new(value: BigDecimal) -> Result<Self> {
        let scale = value.normalized().fractional_digit_count();
        if scale > SCALE {
            return Err(Error::InvalidAmount {
                value: value.to_string(),
                reason: format!("more than {SCALE} fractional digits"),
            });
        }
        // A normalized non-zero value with scale <= -12 is at least 10^12; checking the scale
        // first keeps absurd exponents from being expanded.
        if (!value.is_zero() && scale <= -MAX_INTEGER_DIGITS) || value.abs() >= magnitude_limit() {
            return Err(Error::InvalidAmount {
                value: value.normalized().to_string(),
                reason: format!("more than {MAX_INTEGER_DIGITS} integer digits"),
            });
        }
        Ok(Self(value))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn as_big_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// True when the amount is strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Exact sum, rejected if the result leaves the supported range.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self> {
        Self::in_range(&self.0 + &rhs.0, || format!("{self} + {rhs}"))
    }

    /// Exact difference, rejected if the result leaves the supported range.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        Self::in_range(&self.0 - &rhs.0, || format!("{self} - {rhs}"))
    }

    fn in_range(value: BigDecimal, expression: impl FnOnce() -> String) -> Result<Self> {
        if value.abs() >= magnitude_limit() {
            return Err(Error::AmountOutOfRange {
                reason: format!(
                    "{} = {} exceeds {MAX_INTEGER_DIGITS} integer digits",
                    expression(),
                    value.normalized().to_plain_string()
                ),
            });
        }
        Ok(Self(value))
    }

    /// Canonical storage form: exactly [`SCALE`] fractional digits.
    #[must_use]
    pub fn to_storage_string(&self) -> String {
        self.0.with_scale(SCALE).to_plain_string()
    }

    /// Exact sum of a sequence of amounts.
    pub fn sum<I>(amounts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(), |total, amount| total.checked_add(&amount))
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-&self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.normalized().to_plain_string())
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = BigDecimal::from_str(trimmed).map_err(|e| Error::InvalidAmount {
            value: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(value)
    }
}

impl TryFrom<BigDecimal> for Amount {
    type Error = Error;

    fn try_from(value: BigDecimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for BigDecimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Value {
    fn from(amount: Amount) -> Self {
        Self::from(amount.to_storage_string())
    }
}

impl TryGetable for Amount {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> std::result::Result<Self, TryGetError> {
        let raw = <String as TryGetable>::try_get_by(res, index)?;
        raw.parse()
            .map_err(|e: Error| TryGetError::DbErr(DbErr::Type(format!("stored amount '{raw}': {e}"))))
    }
}

impl ValueType for Amount {
    fn try_from(v: Value) -> std::result::Result<Self, ValueTypeErr> {
        match v {
            Value::String(Some(raw)) => raw.parse().map_err(|_| ValueTypeErr),
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        stringify!(Amount).to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::amount;

    #[test]
    fn test_magnitude_limit_is_ten_to_the_twelfth() {
        assert_eq!(magnitude_limit(), "1000000000000".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_parse_accepts_full_range() {
        let widest: Amount = "999999999999.999999999999999999".parse().unwrap();
        assert_eq!(widest.to_string(), "999999999999.999999999999999999");

        let eleven_digits: Amount = "100000000000.5".parse().unwrap();
        assert_eq!(eleven_digits.to_string(), "100000000000.5");

        let negative: Amount = "-999999999999.000000000000000001".parse().unwrap();
        assert!(negative.is_negative());

        let tiny: Amount = "-0.000000000000000001".parse().unwrap();
        assert!(tiny.is_negative());
    }

    #[test]
    fn test_parse_rejects_excess_precision_and_magnitude() {
        let too_precise = "1.0000000000000000001".parse::<Amount>();
        assert!(matches!(too_precise, Err(Error::InvalidAmount { .. })));

        let too_large = "1000000000000".parse::<Amount>();
        assert!(matches!(too_large, Err(Error::InvalidAmount { .. })));

        let huge_exponent = "1e999999999".parse::<Amount>();
        assert!(matches!(huge_exponent, Err(Error::InvalidAmount { .. })));

        let tiny_exponent = "1e-999999999".parse::<Amount>();
        assert!(matches!(tiny_exponent, Err(Error::InvalidAmount { .. })));

        let garbage = "12abc".parse::<Amount>();
        assert!(matches!(garbage, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_trailing_zeros_beyond_scale_are_accepted() {
        // Only significant fractional digits count against the scale.
        let value: Amount = "1.50000000000000000000".parse().unwrap();
        assert_eq!(value, amount("1.5"));
    }

    #[test]
    fn test_storage_string_is_fixed_scale() {
        let value = amount("100.5");
        assert_eq!(value.to_storage_string(), "100.500000000000000000");
        assert_eq!(Amount::zero().to_storage_string(), "0.000000000000000000");
        assert_eq!(
            amount("-0.000000000000000001").to_storage_string(),
            "-0.000000000000000001"
        );

        let parsed: Amount = value.to_storage_string().parse().unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(amount("60.000").to_string(), "60");
        assert_eq!(amount("-0.25").to_string(), "-0.25");
        assert_eq!(amount("0.000000000000000001").to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_checked_arithmetic_is_exact() {
        assert_eq!(amount("0.1").checked_add(&amount("0.2")).unwrap(), amount("0.3"));

        let big = amount("999999999999");
        let tiny = amount("0.000000000000000001");
        assert_eq!(
            big.checked_add(&tiny).unwrap(),
            amount("999999999999.000000000000000001")
        );

        let diff = amount("50").checked_sub(&amount("100")).unwrap();
        assert_eq!(diff, amount("-50"));
    }

    #[test]
    fn test_checked_add_rejects_out_of_range() {
        let big = amount("999999999999.999999999999999999");
        let result = big.checked_add(&amount("0.000000000000000001"));
        assert!(matches!(result, Err(Error::AmountOutOfRange { .. })));

        let result = amount("-600000000000").checked_sub(&amount("600000000000"));
        assert!(matches!(result, Err(Error::AmountOutOfRange { .. })));
    }

    #[test]
    fn test_negation() {
        assert_eq!(-amount("12.5"), amount("-12.5"));
        assert_eq!(-&amount("-3"), amount("3"));
        assert!(!(-Amount::zero()).is_negative());
        assert_eq!(-Amount::zero(), Amount::zero());
    }

    #[test]
    fn test_sum() {
        let total = Amount::sum([amount("10.0"), amount("20.5"), amount("-5.0")]).unwrap();
        assert_eq!(total, amount("25.5"));
    }
}
