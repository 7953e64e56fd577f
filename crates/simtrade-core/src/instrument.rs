//! Instrument identity and daily price bands.
//!
//! Every listed instrument trades inside a band derived from the previous
//! session's close. The band width depends on the board the symbol is listed
//! on, so it is resolved from the symbol code.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{OrderSide, Price};

/// Strip exchange suffixes/prefixes and whitespace from a symbol code.
///
/// `"600000.SH"`, `"sh600000"` and `" 600000 "` all normalize to `"600000"`.
#[must_use]
pub fn normalize_symbol(raw: &str) -> String {
    let trimmed = raw.trim();
    let code = trimmed.split('.').next().unwrap_or(trimmed);
    let lower = code.to_ascii_lowercase();
    let stripped = ["sh", "sz", "bj"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower);
    stripped.to_string()
}

/// Daily limit-up / limit-down band for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLimits {
    pub limit_up: Price,
    pub limit_down: Price,
}

impl PriceLimits {
    #[must_use]
    pub fn new(limit_up: Price, limit_down: Price) -> Self {
        Self {
            limit_up,
            limit_down,
        }
    }

    /// Derive the band from the previous close and the board's limit fraction.
    #[must_use]
    pub fn from_prev_close(prev_close: Price, limit_pct: Decimal) -> Self {
        Self {
            limit_up: (prev_close * (Decimal::ONE + limit_pct)).round_to_tick(),
            limit_down: (prev_close * (Decimal::ONE - limit_pct)).round_to_tick(),
        }
    }

    /// Whether `price` lies inside the band (inclusive).
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        price >= self.limit_down && price <= self.limit_up
    }

    /// The limit an order on `side` is pushing into, if `price` sits within
    /// `tolerance` (fraction) of it.
    ///
    /// BUYs only pin at limit-up and SELLs only at limit-down; a price at or
    /// through the bound counts as near it.
    #[must_use]
    pub fn near_limit(&self, side: OrderSide, price: Price, tolerance: Decimal) -> Option<Price> {
        let bound = match side {
            OrderSide::Buy => self.limit_up,
            OrderSide::Sell => self.limit_down,
        };
        let through = match side {
            OrderSide::Buy => price >= bound,
            OrderSide::Sell => price <= bound,
        };
        if through || price.distance_pct(bound).is_some_and(|d| d <= tolerance) {
            return Some(bound);
        }
        None
    }
}

/// Board-dependent limit fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardLimitRule {
    /// Main boards (600/601/603/605/000/001/002/003).
    #[serde(default = "default_main_board_pct")]
    pub main_board_pct: Decimal,
    /// ChiNext (300/301) and STAR (688/689).
    #[serde(default = "default_growth_board_pct")]
    pub growth_board_pct: Decimal,
    /// Beijing exchange (4xx/8xx/920).
    #[serde(default = "default_bse_pct")]
    pub bse_pct: Decimal,
}

fn default_main_board_pct() -> Decimal {
    dec!(0.10)
}

fn default_growth_board_pct() -> Decimal {
    dec!(0.20)
}

fn default_bse_pct() -> Decimal {
    dec!(0.30)
}

impl Default for BoardLimitRule {
    fn default() -> Self {
        Self {
            main_board_pct: default_main_board_pct(),
            growth_board_pct: default_growth_board_pct(),
            bse_pct: default_bse_pct(),
        }
    }
}

impl BoardLimitRule {
    /// Limit fraction for `symbol`.
    #[must_use]
    pub fn limit_pct(&self, symbol: &str) -> Decimal {
        let code = normalize_symbol(symbol);
        if ["300", "301", "688", "689"]
            .iter()
            .any(|p| code.starts_with(p))
        {
            self.growth_board_pct
        } else if code.starts_with('4') || code.starts_with('8') || code.starts_with("920") {
            self.bse_pct
        } else {
            self.main_board_pct
        }
    }

    /// Band for `symbol` given its previous close.
    #[must_use]
    pub fn limits_for(&self, symbol: &str, prev_close: Price) -> PriceLimits {
        PriceLimits::from_prev_close(prev_close, self.limit_pct(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("600000.SH"), "600000");
        assert_eq!(normalize_symbol("sz000001"), "000001");
        assert_eq!(normalize_symbol(" 300750 "), "300750");
    }

    #[test]
    fn test_limits_from_prev_close() {
        let limits = PriceLimits::from_prev_close(Price::new(dec!(10)), dec!(0.10));
        assert_eq!(limits.limit_up, Price::new(dec!(11)));
        assert_eq!(limits.limit_down, Price::new(dec!(9)));
        assert!(limits.contains(Price::new(dec!(10.5))));
        assert!(!limits.contains(Price::new(dec!(11.01))));
    }

    #[test]
    fn test_limit_rounding_to_tick() {
        // 12.34 * 1.1 = 13.574 -> 13.57
        let limits = PriceLimits::from_prev_close(Price::new(dec!(12.34)), dec!(0.10));
        assert_eq!(limits.limit_up, Price::new(dec!(13.57)));
        assert_eq!(limits.limit_down, Price::new(dec!(11.11)));
    }

    #[test]
    fn test_board_rule() {
        let rule = BoardLimitRule::default();
        assert_eq!(rule.limit_pct("600519"), dec!(0.10));
        assert_eq!(rule.limit_pct("300750.SZ"), dec!(0.20));
        assert_eq!(rule.limit_pct("688981"), dec!(0.20));
        assert_eq!(rule.limit_pct("830799"), dec!(0.30));
    }

    #[test]
    fn test_near_limit_follows_side() {
        let limits = PriceLimits::from_prev_close(Price::new(dec!(10)), dec!(0.10));
        let tol = dec!(0.01);
        let px = |v| Price::new(v);

        assert_eq!(limits.near_limit(OrderSide::Buy, px(dec!(10.95)), tol), Some(limits.limit_up));
        assert_eq!(limits.near_limit(OrderSide::Buy, px(dec!(11.20)), tol), Some(limits.limit_up));
        assert_eq!(limits.near_limit(OrderSide::Sell, px(dec!(9.05)), tol), Some(limits.limit_down));
        assert_eq!(limits.near_limit(OrderSide::Sell, px(dec!(8.80)), tol), Some(limits.limit_down));

        // Moving away from the bound never pins
        assert_eq!(limits.near_limit(OrderSide::Sell, px(dec!(10.95)), tol), None);
        assert_eq!(limits.near_limit(OrderSide::Buy, px(dec!(9.05)), tol), None);
        assert_eq!(limits.near_limit(OrderSide::Buy, px(dec!(10.50)), tol), None);
    }
}
