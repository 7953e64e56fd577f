//! Risk gate for the simtrade pipeline.
//!
//! A stateless evaluator consulted before opening a position and while one
//! is held:
//! - Scenario veto: hard block on banned market-pattern tags
//! - Portfolio constraints: holdings count and per-stock notional cap
//! - Exit rules: price stop and time stop

pub mod error;
pub mod gates;

pub use error::{RiskError, RiskResult};
pub use gates::{
    ExitDecision, ExitReason, Exposure, RiskConfig, RiskControlManager, RiskDecision, RiskReason,
};
