use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Limit or execution price.
///
/// `Price::ZERO` doubles as the "no orders" sentinel returned by the
/// best/worst price queries of an empty side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Canonical textual form used as a storage key component.
    ///
    /// Trailing zeros are stripped so `960`, `960.0` and `960.00` share a level.
    pub fn to_key(&self) -> String {
        self.0.normalize().to_string()
    }

    /// Round down to the nearest multiple of `tick_size`.
    ///
    /// `None` when the tick count does not fit in a `Decimal`.
    pub fn round_to_tick(&self, tick_size: Price) -> Option<Price> {
        if tick_size.is_zero() {
            return Some(*self);
        }
        let ticks = self.0.checked_div(tick_size.0)?.floor();
        ticks.checked_mul(tick_size.0).map(Price)
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Price(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Decimal {
        price.0
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Price(s.parse::<Decimal>()?))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Price {
    fn default() -> Self {
        Price::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_key_is_normalized() {
        assert_eq!(Price::from(dec!(960.00)).to_key(), "960");
        assert_eq!(Price::from(dec!(960)).to_key(), "960");
        assert_eq!(Price::from(dec!(0.0500)).to_key(), "0.05");
    }

    #[test]
    fn test_round_to_tick() {
        let price = Price::from(dec!(100.37));
        assert_eq!(
            price.round_to_tick(Price::from(dec!(0.25))),
            Some(Price::from(dec!(100.25)))
        );
        assert_eq!(price.round_to_tick(Price::ZERO), Some(price));
    }

    #[test]
    fn test_round_to_tick_out_of_range() {
        let huge = Price::from(Decimal::MAX);
        assert_eq!(huge.round_to_tick(Price::from(dec!(0.5))), None);
        assert_eq!(huge.round_to_tick(Price::from(dec!(1))), Some(huge));
    }

    #[test]
    fn test_ordering_and_sign() {
        assert!(Price::from(dec!(940)) < Price::from(dec!(960)));
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::from(dec!(-1)).is_positive());
        assert!(Price::from(dec!(0.0001)).is_positive());
    }
}
