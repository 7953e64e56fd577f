//! Core domain types for the simtrade ledger.
//!
//! This crate provides fundamental types shared by every stage of the
//! admission → risk → order → ledger pipeline:
//! - `Price`: Precision-safe price/amount type
//! - `OrderId`, `OrderSide`, `OrderKind`, `OrderStatus`, `Order`: Order model
//! - `Signal`: Ranked trade proposal
//! - `Quote`, `SessionPhase`, `QuoteGateway`: Normalized price input
//! - `PriceLimits`, `BoardLimitRule`: Daily limit-up/limit-down bands
//! - `session`: Trading-day arithmetic

pub mod decimal;
pub mod error;
pub mod instrument;
pub mod order;
pub mod quote;
pub mod session;
pub mod signal;

pub use decimal::{round_down_to_lot, Price};
pub use error::{CoreError, Result};
pub use instrument::{normalize_symbol, BoardLimitRule, PriceLimits};
pub use order::{Order, OrderId, OrderKind, OrderSide, OrderStatus};
pub use quote::{Quote, QuoteGateway, RawTick, SessionPhase};
pub use session::{is_trading_day, phase_at, trading_days_between};
pub use signal::Signal;
