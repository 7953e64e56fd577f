//! Risk error types.
//!
//! Only caller-contract violations are errors; a "not allowed" verdict is a
//! [`crate::RiskDecision`] value.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Non-positive entry price: {0}")]
    InvalidEntryPrice(String),

    #[error("Date regression: current {current} precedes entry {entry}")]
    DateRegression { entry: NaiveDate, current: NaiveDate },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
