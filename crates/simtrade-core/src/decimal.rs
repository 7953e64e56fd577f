//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Cash and prices on
//! the exchange are quoted in cents, so every derived price is rounded to
//! two decimal places before it reaches the ledger.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to keep prices apart from cash amounts and share counts
/// in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exchange tick: 0.01.
    pub const TICK: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round half-up to the exchange tick (0.01).
    #[inline]
    pub fn round_to_tick(&self) -> Self {
        Self(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Fractional return relative to `base`: `(self - base) / base`.
    ///
    /// Returns None when `base` is zero.
    #[inline]
    pub fn return_from(&self, base: Price) -> Option<Decimal> {
        if base.is_zero() {
            return None;
        }
        Some((self.0 - base.0) / base.0)
    }

    /// Absolute relative distance to `other`: `|self - other| / other`.
    #[inline]
    pub fn distance_pct(&self, other: Price) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some((self.0 - other.0).abs() / other.0)
    }

    /// Notional value of `quantity` shares at this price.
    #[inline]
    pub fn notional(&self, quantity: u64) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Round a share count down to a whole number of lots.
///
/// A zero lot size leaves the quantity untouched.
#[inline]
pub fn round_down_to_lot(quantity: u64, lot_size: u64) -> u64 {
    if lot_size == 0 {
        return quantity;
    }
    quantity / lot_size * lot_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_return_from() {
        let entry = Price::new(dec!(10));
        let now = Price::new(dec!(9.5));

        assert_eq!(now.return_from(entry), Some(dec!(-0.05)));
        assert_eq!(now.return_from(Price::ZERO), None);
    }

    #[test]
    fn test_price_round_to_tick() {
        assert_eq!(Price::new(dec!(10.015)).round_to_tick().0, dec!(10.02));
        assert_eq!(Price::new(dec!(10.014)).round_to_tick().0, dec!(10.01));
        assert_eq!(Price::TICK, dec!(0.01));
    }

    #[test]
    fn test_distance_pct() {
        let limit_up = Price::new(dec!(11));
        let px = Price::new(dec!(10.89));

        assert_eq!(px.distance_pct(limit_up), Some(dec!(0.01)));
    }

    #[test]
    fn test_notional_calculation() {
        assert_eq!(Price::new(dec!(12.34)).notional(300), dec!(3702));
    }

    #[test]
    fn test_round_down_to_lot() {
        assert_eq!(round_down_to_lot(1_250, 100), 1_200);
        assert_eq!(round_down_to_lot(99, 100), 0);
        assert_eq!(round_down_to_lot(99, 0), 99);
    }

    #[test]
    fn test_price_from_str_trims() {
        let p: Price = " 10.50 ".parse().unwrap();
        assert_eq!(p, Price::new(dec!(10.50)));
    }
}
