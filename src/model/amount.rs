//! Amount type for handling monetary values with optional currency signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that may
//! or may not include a currency sign and thousands separators. The record store is not consistent
//! about this: some endpoints send `"1,250.00"`, some send `1250`, and a few send `"฿1,250.00"`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Currency signs that are stripped while parsing.
const CURRENCY_SIGNS: &[char] = &['฿', '$'];

/// Represents a monetary amount.
///
/// Unlike the raw `Decimal`, `Amount` displays with thousands separators and two decimal places,
/// which is the way amounts are shown in the voucher reports.
///
/// # Examples
///
/// ```
/// # use haulboard::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("฿1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Handle empty string
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let without_sign = unsigned.trim_start_matches(CURRENCY_SIGNS);
        let without_commas = without_sign.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{sign}{}",
            format_num::format_num!(",.2", rounded.abs().to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts JSON strings and JSON numbers.
struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Decimal::try_from(v)
            .map(Amount)
            .map_err(|e| E::custom(format!("invalid amount {v}: {e}")))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount::ZERO)
    }
}

/// Saturates at `Decimal::MAX` and `Decimal::MIN` instead of panicking on overflow.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_with_baht_sign() {
        let amount = Amount::from_str("฿50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_negative_with_sign() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("").unwrap();
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str(" 1,234,567.89 ").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("12abc").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(dec("60000")).to_string(), "60,000.00");
        assert_eq!(Amount::new(dec("-7.5")).to_string(), "-7.50");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let amounts: Vec<Amount> = serde_json::from_str(r#"[100, 12.25, "1,000.50", null]"#).unwrap();
        let values: Vec<Decimal> = amounts.iter().map(Amount::value).collect();
        assert_eq!(
            values,
            vec![dec("100"), dec("12.25"), dec("1000.50"), Decimal::ZERO]
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&Amount::new(dec("50.10"))).unwrap();
        assert_eq!(json, "\"50.10\"");
    }

    #[test]
    fn test_sum() {
        let total: Amount = ["100", "50", "200"]
            .iter()
            .map(|s| Amount::from_str(s).unwrap())
            .sum();
        assert_eq!(total.value(), dec("350"));
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        let huge = Amount::new(Decimal::MAX);
        let total: Amount = [huge, Amount::from_str("1").unwrap(), huge].into_iter().sum();
        assert_eq!(total.value(), Decimal::MAX);

        let mut low = Amount::new(Decimal::MIN);
        low += Amount::from_str("-5").unwrap();
        assert_eq!(low.value(), Decimal::MIN);
    }
}
