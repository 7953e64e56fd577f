//! Prometheus metrics for simtrade.
//!
//! Covers:
//! - Order submission and rejection by reason
//! - Fills and fill rejections
//! - Admission outcomes per cycle
//! - Exit triggers
//! - Account state gauges
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug; it only happens during
//! static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_gauge, CounterVec,
    Encoder, Gauge, Histogram, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Orders accepted by the engine.
/// Labels: side (buy/sell), kind (market/limit)
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_orders_submitted_total",
        "Total orders accepted by the order engine",
        &["side", "kind"]
    )
    .unwrap()
});

/// Submissions rejected before an order was created.
pub static ORDERS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_orders_rejected_total",
        "Total order submissions rejected",
        &["reason"]
    )
    .unwrap()
});

/// Market orders converted to limit orders at the daily band.
pub static ORDERS_COERCED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_orders_coerced_total",
        "Market orders coerced to limit orders at the price band",
        &["side"]
    )
    .unwrap()
});

/// Orders cancelled while in flight.
pub static ORDERS_CANCELLED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_orders_cancelled_total",
        "Total in-flight orders cancelled",
        &["side"]
    )
    .unwrap()
});

/// Fills applied to the ledger.
/// Labels: side, status (partial/filled)
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_fills_total",
        "Total fills applied to the ledger",
        &["side", "status"]
    )
    .unwrap()
});

/// Fill attempts that left the order unchanged.
pub static FILLS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_fills_skipped_total",
        "Fill attempts not executed",
        &["reason"]
    )
    .unwrap()
});

/// Age of quotes offered for fills, in milliseconds.
pub static QUOTE_AGE_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "simtrade_quote_age_ms",
        "Age of quotes offered to the order engine in milliseconds",
        vec![100.0, 500.0, 1000.0, 5000.0, 15000.0, 30000.0, 60000.0, 300000.0]
    )
    .unwrap()
});

/// Admission outcomes.
/// Labels: outcome (admitted/rejected_duplicate_position/...)
pub static ADMISSION_OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_admission_outcomes_total",
        "Signals resolved by the admission pool",
        &["outcome"]
    )
    .unwrap()
});

/// Exit triggers raised by the risk gate.
pub static EXITS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "simtrade_exits_total",
        "Exit rules triggered on held positions",
        &["reason"]
    )
    .unwrap()
});

/// Cash balance.
pub static CASH_BALANCE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("simtrade_cash_balance", "Account cash balance").unwrap());

/// Cash plus market value of positions.
pub static TOTAL_EQUITY: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("simtrade_total_equity", "Account total equity").unwrap());

/// Open positions.
pub static OPEN_POSITIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("simtrade_open_positions", "Number of open positions").unwrap()
});

/// Orders in Pending or Partial state.
pub static IN_FLIGHT_ORDERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("simtrade_in_flight_orders", "Number of in-flight orders").unwrap()
});

/// Completed session rolls.
pub static SESSION: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("simtrade_session", "Session counter of the ledger").unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record an accepted order.
    pub fn order_submitted(side: &str, kind: &str) {
        ORDERS_SUBMITTED_TOTAL.with_label_values(&[side, kind]).inc();
    }

    /// Record a rejected submission.
    pub fn order_rejected(reason: &str) {
        ORDERS_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a market-to-limit coercion.
    pub fn order_coerced(side: &str) {
        ORDERS_COERCED_TOTAL.with_label_values(&[side]).inc();
    }

    pub fn order_cancelled(side: &str) {
        ORDERS_CANCELLED_TOTAL.with_label_values(&[side]).inc();
    }

    /// Record a fill applied to the ledger.
    pub fn fill_applied(side: &str, status: &str) {
        FILLS_TOTAL.with_label_values(&[side, status]).inc();
    }

    /// Record a fill attempt that did not execute.
    pub fn fill_skipped(reason: &str) {
        FILLS_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn quote_age(age_ms: i64) {
        QUOTE_AGE_MS.observe(age_ms.max(0) as f64);
    }

    /// Record one resolved admission.
    pub fn admission_outcome(outcome: &str) {
        ADMISSION_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn exit_triggered(reason: &str) {
        EXITS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Update account gauges.
    pub fn account_state(cash: f64, equity: f64, positions: usize, in_flight: usize) {
        CASH_BALANCE.set(cash);
        TOTAL_EQUITY.set(equity);
        OPEN_POSITIONS.set(positions as i64);
        IN_FLIGHT_ORDERS.set(in_flight as i64);
    }

    pub fn session_rolled(session: u64) {
        SESSION.set(session as i64);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
