//! [`Price`] definitions.

use std::str::FromStr;

use common::{money::Currency, Money};
use derive_more::{Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Non-negative monetary value with two fraction digits, without a currency.
///
/// Stored as `NUMERIC(10, 2)`.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of digits in a [`Price`].
    const MAX_DIGITS: u32 = 10;

    /// Creates a new [`Price`] if the given `value` is valid.
    ///
    /// A valid [`Price`] is non-negative, has at most 2 fraction digits and
    /// at most 10 digits total.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        Self::check(value).then(|| {
            let mut value = value.normalize();
            value.rescale(Money::SCALE);
            Self(value)
        })
    }

    /// Checks whether the given `value` is a valid [`Price`].
    fn check(value: Decimal) -> bool {
        let value = value.normalize();
        if value.is_sign_negative() && !value.is_zero() {
            return false;
        }
        if value.scale() > Money::SCALE {
            return false;
        }
        let integral = value.trunc().abs().to_string();
        let integral_digits = u32::try_from(integral.len()).unwrap_or(u32::MAX);
        integral_digits <= Self::MAX_DIGITS - Money::SCALE
    }

    /// Returns the inner [`Decimal`] of this [`Price`].
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns this [`Price`] multiplied by the given `factor`.
    ///
    /// [`None`] is returned if the result is not a valid [`Price`].
    #[must_use]
    pub fn times(self, factor: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(factor)).and_then(Self::new)
    }

    /// Expresses this [`Price`] as [`Money`] in the provided [`Currency`].
    #[must_use]
    pub fn in_currency(self, currency: Currency) -> Money {
        Money::new(self.0, currency)
    }
}

impl FromStr for Price {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Decimal>()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Price`")
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Self::new(<Decimal as Deserialize>::deserialize(d)?).ok_or_else(|| {
            serde::de::Error::custom(
                "ensure the value is non-negative with at most 2 decimal \
                 places and 10 digits in total",
            )
        })
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Price;

    #[test]
    fn accepts_two_fraction_digits() {
        let p: Price = "120.5".parse().unwrap();

        assert_eq!(p.to_string(), "120.50");
        assert_eq!("0".parse::<Price>().unwrap().to_string(), "0.00");
        let max = "99999999.99".parse::<Price>().unwrap();
        assert_eq!(max.to_string(), "99999999.99");
    }

    #[test]
    fn rejects_invalid_values() {
        for input in ["-1", "1.234", "100000000", "abc", ""] {
            assert!(input.parse::<Price>().is_err(), "{input}");
        }
    }

    #[test]
    fn multiplies() {
        let p = Price::new(Decimal::new(4999, 2)).unwrap();

        assert_eq!(p.times(3).unwrap().to_string(), "149.97");
        assert!(Price::new(Decimal::new(9_000_000_000, 2))
            .unwrap()
            .times(3)
            .is_none());
    }

    #[test]
    fn deserializes_only_valid_values() {
        let p: Price = serde_json::from_str("\"450.00\"").unwrap();

        assert_eq!(p.to_string(), "450.00");
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
        assert!(serde_json::from_str::<Price>("\"1.234\"").is_err());
    }
}
