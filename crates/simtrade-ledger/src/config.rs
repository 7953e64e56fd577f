//! Account construction parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Explicit configuration for one simulated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Starting cash.
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    /// Commission as a fraction of fill notional.
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    /// Floor applied to every commission charge (0 disables).
    #[serde(default)]
    pub min_commission: Decimal,
    /// Lock same-session purchases until the next session roll.
    #[serde(default = "default_t_plus_one")]
    pub t_plus_one: bool,
}

fn default_initial_capital() -> Decimal {
    Decimal::from(100_000)
}

fn default_commission_rate() -> Decimal {
    Decimal::new(3, 4) // 0.0003
}

fn default_t_plus_one() -> bool {
    true
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            commission_rate: default_commission_rate(),
            min_commission: Decimal::ZERO,
            t_plus_one: default_t_plus_one(),
        }
    }
}

impl AccountConfig {
    #[must_use]
    pub fn with_capital(mut self, capital: Decimal) -> Self {
        self.initial_capital = capital;
        self
    }

    /// Commission charged on a fill of the given notional.
    #[must_use]
    pub fn commission_for(&self, notional: Decimal) -> Decimal {
        let raw = notional * self.commission_rate;
        if raw < self.min_commission {
            self.min_commission
        } else {
            raw
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.initial_capital.is_sign_negative() {
            return Err(LedgerError::ConfigError(format!(
                "initial_capital must be >= 0, got {}",
                self.initial_capital
            )));
        }
        if self.commission_rate.is_sign_negative() || self.commission_rate >= Decimal::ONE {
            return Err(LedgerError::ConfigError(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        if self.min_commission.is_sign_negative() {
            return Err(LedgerError::ConfigError(format!(
                "min_commission must be >= 0, got {}",
                self.min_commission
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
    fn test_commission_floor() {
        let config = AccountConfig {
            min_commission: dec!(5),
            ..Default::default()
        };
        // 10_000 * 0.0003 = 3 -> floored to 5
        assert_eq!(config.commission_for(dec!(10000)), dec!(5));
        // 100_000 * 0.0003 = 30
        assert_eq!(config.commission_for(dec!(100000)), dec!(30));
    }

    #[test]
    fn test_config_from_toml_defaults() {
        let config: AccountConfig = toml::from_str("initial_capital = \"50000\"").unwrap();
        assert_eq!(config.initial_capital, dec!(50000));
        assert_eq!(config.commission_rate, dec!(0.0003));
        assert!(config.t_plus_one);
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let config = AccountConfig {
            commission_rate: dec!(-0.1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
