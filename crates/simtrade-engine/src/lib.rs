//! Order engine for the simtrade ledger.
//!
//! Turns submissions into orders and quotes into fills:
//! - Order state machine (Pending → Filled/Partial/Cancelled/Rejected)
//! - Duplicate-submission guard: one in-flight order per symbol
//! - Price-limit coercion of market orders near the daily band
//! - Staleness guard on quotes (call auction exempt)
//! - Cash reservation for in-flight BUY orders
//!
//! [`AccountHandle`] wraps one engine (and its ledger) behind a single
//! `RwLock` so every mutation is one critical section.

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;

pub use config::EngineConfig;
pub use engine::{
    CancelResult, FillRejectReason, FillResult, OrderEngine, SubmitRejectReason, SubmitResult,
};
pub use error::{EngineError, EngineResult};
pub use handle::AccountHandle;
