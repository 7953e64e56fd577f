//! Engine error types.
//!
//! These are caller-contract violations. Market conditions (stale quote,
//! insufficient cash, duplicate order) are result values, not errors.

use simtrade_core::{OrderId, OrderStatus};
use simtrade_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: String },

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Quote for {actual} offered to order {order_id} on {expected}")]
    SymbolMismatch {
        order_id: OrderId,
        expected: String,
        actual: String,
    },

    #[error("Illegal transition for {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
