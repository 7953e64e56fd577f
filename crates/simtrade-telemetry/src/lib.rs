//! Prometheus metrics and structured logging for simtrade.
//!
//! - Prometheus counters for orders, fills, admissions and exits
//! - Account gauges (cash, equity, holdings)
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
