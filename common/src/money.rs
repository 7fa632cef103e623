//! [`Money`]-related definitions.

use rust_decimal::Decimal;

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of fraction digits every [`Money`] amount is rounded to.
    pub const SCALE: u32 = 2;

    /// Creates a new [`Money`] rounding the `amount` to [`Money::SCALE`]
    /// fraction digits.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        let mut amount = amount.round_dp(Self::SCALE);
        amount.rescale(Self::SCALE);
        Self { amount, currency }
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Ethiopian Birr."]
        Etb = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rounds_to_cents() {
        let m = Money::new(decimal("100"), Currency::Etb);
        assert_eq!(m.amount.to_string(), "100.00");

        let m = Money::new(decimal("12.345"), Currency::Usd);
        assert_eq!(m.amount.to_string(), "12.34");

        let m = Money::new(decimal("0.5"), Currency::Eur);
        assert_eq!(m.amount.to_string(), "0.50");
    }
}
