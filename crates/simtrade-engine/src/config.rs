//! Order engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use simtrade_core::BoardLimitRule;

use crate::error::{EngineError, EngineResult};

/// Configuration for the order engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum tradable lot in shares.
    #[serde(default = "default_lot_size")]
    pub lot_size: u64,
    /// Slippage applied to MARKET fills (fraction of the quote).
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: Decimal,
    /// Distance to a daily limit (fraction) that triggers market→limit coercion.
    #[serde(default = "default_limit_tolerance_pct")]
    pub limit_tolerance_pct: Decimal,
    /// Quotes older than this are not filled against outside the call auction.
    #[serde(default = "default_max_quote_age_ms")]
    pub max_quote_age_ms: i64,
    /// Daily limit fractions by board.
    #[serde(default)]
    pub board_limits: BoardLimitRule,
}

fn default_lot_size() -> u64 {
    100
}

fn default_slippage_pct() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn default_limit_tolerance_pct() -> Decimal {
    Decimal::new(1, 2) // 1%
}

fn default_max_quote_age_ms() -> i64 {
    15_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lot_size: default_lot_size(),
            slippage_pct: default_slippage_pct(),
            limit_tolerance_pct: default_limit_tolerance_pct(),
            max_quote_age_ms: default_max_quote_age_ms(),
            board_limits: BoardLimitRule::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.lot_size == 0 {
            return Err(EngineError::ConfigError("lot_size must be > 0".to_string()));
        }
        if self.slippage_pct.is_sign_negative() || self.slippage_pct >= Decimal::ONE {
            return Err(EngineError::ConfigError(format!(
                "slippage_pct must be in [0, 1), got {}",
                self.slippage_pct
            )));
        }
        if self.limit_tolerance_pct.is_sign_negative() {
            return Err(EngineError::ConfigError(format!(
                "limit_tolerance_pct must be >= 0, got {}",
                self.limit_tolerance_pct
            )));
        }
        if self.max_quote_age_ms <= 0 {
            return Err(EngineError::ConfigError(format!(
                "max_quote_age_ms must be > 0, got {}",
                self.max_quote_age_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.lot_size, 100);
        assert_eq!(config.slippage_pct, dec!(0.001));
        assert_eq!(config.max_quote_age_ms, 15_000);
        assert_eq!(config.board_limits.main_board_pct, dec!(0.10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lot_rejected() {
        let config = EngineConfig {
            lot_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
