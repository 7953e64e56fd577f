//! Signal admission for simtrade.
//!
//! Implements the Collect → Rank → Execute cycle: signals are buffered,
//! ranked by score, and offered one by one to the risk gate and the order
//! engine so that higher-scored signals always consume capital first.

pub mod config;
pub mod error;
pub mod outcome;
pub mod pool;

pub use config::AdmissionConfig;
pub use error::{AdmissionError, AdmissionResult};
pub use outcome::{AdmissionDetail, AdmissionOutcome, AdmissionSummary};
pub use pool::SignalPool;
