//! Exact-decimal payment amounts.
//!
//! All amounts in the protocol are decimal strings on the wire ("0.10"),
//! never floats: a server comparing `0.099999` against a required `0.10`
//! with floating point would open a rounding exploit. [`Amount`] wraps
//! [`rust_decimal::Decimal`] and serializes to the string wire format.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative decimal token amount in human-readable units.
///
/// Equality and ordering are numeric (`"0.10" == "0.100"`), while the
/// original scale is preserved for display, so `"0.10"` round-trips as
/// `"0.10"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

/// Failure to parse a decimal amount string.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AmountParseError {
    /// The string is not a valid decimal number.
    #[error("not a decimal number: {0}")]
    NotDecimal(String),
    /// The value is negative; protocol amounts are never negative.
    #[error("amount must not be negative: {0}")]
    Negative(String),
}

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Returns `true` if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns the inner decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| AmountParseError::NotDecimal(s.to_owned()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountParseError::Negative(s.to_owned()));
        }
        Ok(Self(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Self>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_preserves_scale() {
        let a = amount("0.10");
        assert_eq!(a.to_string(), "0.10");
        assert!(a.is_positive());
    }

    #[test]
    fn compares_exactly() {
        assert!(amount("0.099999") < amount("0.10"));
        assert_eq!(amount("0.10"), amount("0.100"));
        assert!(amount("0.11") > amount("0.10"));
    }

    #[test]
    fn rejects_garbage_and_negatives() {
        assert!("ten".parse::<Amount>().is_err());
        assert!("-0.10".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
    }

    #[test]
    fn serde_round_trip_is_a_string() {
        let json = serde_json::to_string(&amount("1.50")).unwrap();
        assert_eq!(json, "\"1.50\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount("1.50"));
    }

    #[test]
    fn deserialization_fails_closed() {
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
        assert!(serde_json::from_str::<Amount>("0.1").is_err()); // must be a string
    }
}
