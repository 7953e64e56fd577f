//! Cash and position ledger for the simtrade account.
//!
//! Owns the cash balance, one position per symbol (quantity, weighted
//! average cost, T+1 locked quantity, last mark) and the append-only order
//! and fill history. Only the order engine mutates a ledger, and it does so
//! under a single writer.
//!
//! # Key Components
//!
//! - [`Ledger`]: The account state and its mutators (`apply_fill`, `roll_session`)
//! - [`AccountConfig`]: Explicit construction parameters (capital, commission, T+1)
//! - [`Position`]: One open holding
//! - [`Fill`]: An execution handed over by the order engine
//! - [`AccountStatus`]: Read-only reporting projection

pub mod config;
pub mod error;
pub mod ledger;
pub mod position;

pub use config::AccountConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{AccountStatus, Fill, Ledger};
pub use position::Position;
