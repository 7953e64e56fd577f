//! Ledger error types.
//!
//! These are caller-contract violations: the order engine checks
//! affordability and sellable quantity before a fill reaches the ledger.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash { required: Decimal, available: Decimal },

    #[error("Insufficient sellable quantity for {symbol}: requested {requested}, sellable {sellable}")]
    InsufficientSellable {
        symbol: String,
        requested: u64,
        sellable: u64,
    },

    #[error("Invalid fill: {0}")]
    InvalidFill(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
