//! Admission cycle parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdmissionError, AdmissionResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum signals admitted in one cycle.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Share of available cash targeted by each admission.
    #[serde(default = "default_position_size_fraction")]
    pub position_size_fraction: Decimal,
}

fn default_max_positions() -> usize {
    5
}

fn default_position_size_fraction() -> Decimal {
    Decimal::new(2, 1) // 0.2
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_positions: default_max_positions(),
            position_size_fraction: default_position_size_fraction(),
        }
    }
}

impl AdmissionConfig {
    pub fn validate(&self) -> AdmissionResult<()> {
        if self.position_size_fraction <= Decimal::ZERO
            || self.position_size_fraction > Decimal::ONE
        {
            return Err(AdmissionError::ConfigError(format!(
                "position_size_fraction must be in (0, 1], got {}",
                self.position_size_fraction
            )));
        }
        Ok(())
    }
}
