//! Signal pool: Collect → Rank → Execute.
//!
//! # Per-signal Check Order
//!
//! 1. Scenario veto            → RejectedRiskVeto (before any capital check)
//! 2. Position or order exists → RejectedDuplicatePosition
//! 3. Cycle admission cap      → RejectedPositionLimit
//! 4. Target below one lot     → RejectedCapitalExhausted
//! 5. Size to affordable lots
//! 6. Portfolio constraints    → RejectedPositionLimit / RejectedRiskVeto
//! 7. Submit LIMIT BUY         → Admitted, or mapped engine rejection
//!
//! No rejection aborts the cycle; every signal gets exactly one outcome.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use simtrade_core::{normalize_symbol, round_down_to_lot, OrderKind, OrderSide, Price, Signal};
use simtrade_engine::{AccountHandle, OrderEngine, SubmitRejectReason, SubmitResult};
use simtrade_risk::{RiskControlManager, RiskDecision};
use simtrade_telemetry::Metrics;

use crate::config::AdmissionConfig;
use crate::outcome::{AdmissionDetail, AdmissionOutcome, AdmissionSummary};

/// Buffer of candidate signals for one admission cycle.
#[derive(Debug, Default)]
pub struct SignalPool {
    signals: Vec<Signal>,
}

impl SignalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an untagged signal.
    pub fn add_signal(
        &mut self,
        symbol: impl Into<String>,
        score: f64,
        price: Price,
        quantity_hint: u64,
        reason: impl Into<String>,
    ) {
        self.push(Signal::new(symbol, score, price, quantity_hint, reason));
    }

    /// Buffer a signal carrying a scenario tag.
    pub fn add_tagged_signal(
        &mut self,
        symbol: impl Into<String>,
        score: f64,
        price: Price,
        quantity_hint: u64,
        reason: impl Into<String>,
        scenario_tag: impl Into<String>,
    ) {
        self.push(Signal::new(symbol, score, price, quantity_hint, reason).with_scenario(scenario_tag));
    }

    pub fn push(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Run one admission cycle against a shared account under one write lock.
    pub fn execute(
        &mut self,
        account: &AccountHandle,
        risk: &RiskControlManager,
        config: &AdmissionConfig,
        now: DateTime<Utc>,
    ) -> AdmissionSummary {
        account.with_engine_mut(|engine| {
            self.execute_signals(
                engine,
                risk,
                config.max_positions,
                config.position_size_fraction,
                now,
            )
        })
    }

    /// Rank buffered signals and admit them in score order.
    ///
    /// The buffer is drained.
    pub fn execute_signals(
        &mut self,
        engine: &mut OrderEngine,
        risk: &RiskControlManager,
        max_positions: usize,
        position_size_fraction: Decimal,
        now: DateTime<Utc>,
    ) -> AdmissionSummary {
        let mut ranked = std::mem::take(&mut self.signals);
        // Stable: equal scores keep insertion order
        ranked.sort_by(|a, b| rank_order(a.score, b.score));

        info!(
            signals = ranked.len(),
            max_positions,
            fraction = %position_size_fraction,
            available = %engine.available_cash(),
            "Admission cycle started"
        );

        let mut cycle = Cycle {
            engine,
            risk,
            max_positions,
            fraction: position_size_fraction,
            admitted: 0,
        };
        let mut summary = AdmissionSummary::default();

        for signal in &ranked {
            let detail = cycle.evaluate(signal, now);
            Metrics::admission_outcome(detail.outcome.as_str());
            if detail.outcome.is_admitted() {
                info!(
                    symbol = %detail.symbol,
                    score = detail.score,
                    quantity = detail.quantity,
                    price = %detail.price,
                    order_id = ?detail.order_id,
                    "Signal admitted"
                );
            } else {
                debug!(
                    symbol = %detail.symbol,
                    score = detail.score,
                    outcome = %detail.outcome,
                    reason = %detail.reason,
                    "Signal rejected"
                );
            }
            summary.record(detail);
        }

        summary.remaining_capital = cycle.engine.available_cash();
        info!(
            executed = summary.executed,
            rejected = summary.rejected,
            remaining_capital = %summary.remaining_capital,
            "Admission cycle finished"
        );
        summary
    }
}

/// Descending by score; NaN ranks last.
fn rank_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// State threaded through one cycle.
struct Cycle<'a> {
    engine: &'a mut OrderEngine,
    risk: &'a RiskControlManager,
    max_positions: usize,
    fraction: Decimal,
    admitted: usize,
}

impl Cycle<'_> {
    fn evaluate(&mut self, signal: &Signal, now: DateTime<Utc>) -> AdmissionDetail {
        let symbol = normalize_symbol(&signal.symbol);
        let price = signal.suggested_price;
        let reject = |outcome: AdmissionOutcome, reason: String| AdmissionDetail {
            symbol: symbol.clone(),
            score: signal.score,
            outcome,
            reason,
            order_id: None,
            quantity: 0,
            price,
        };

        // 1. Scenario veto
        match self
            .risk
            .can_open_by_scenario(&symbol, signal.scenario_tag.as_deref())
        {
            Ok(RiskDecision::Allow) => {}
            Ok(RiskDecision::Deny { reason }) => {
                return reject(AdmissionOutcome::RejectedRiskVeto, reason.to_string());
            }
            Err(e) => {
                warn!(symbol = %signal.symbol, error = %e, "Malformed signal");
                return reject(AdmissionOutcome::RejectedRiskVeto, e.to_string());
            }
        }
        if !price.is_positive() {
            warn!(symbol = %symbol, price = %price, "Malformed signal price");
            return reject(
                AdmissionOutcome::RejectedRiskVeto,
                format!("invalid suggested price {price}"),
            );
        }

        // 2. One position or order per symbol
        if self.engine.ledger().has_position(&symbol) {
            return reject(
                AdmissionOutcome::RejectedDuplicatePosition,
                "position already open".to_string(),
            );
        }
        if self.engine.has_in_flight(&symbol) {
            return reject(
                AdmissionOutcome::RejectedDuplicatePosition,
                "order already in flight".to_string(),
            );
        }

        // 3. Cycle cap
        if self.admitted >= self.max_positions {
            return reject(
                AdmissionOutcome::RejectedPositionLimit,
                format!("{} admitted this cycle, max {}", self.admitted, self.max_positions),
            );
        }

        // 4. Capital
        let lot = self.engine.config().lot_size;
        let available = self.engine.available_cash();
        let target = available * self.fraction;
        let lot_cost = self.engine.estimated_cost(price, lot);
        if target < lot_cost {
            return reject(
                AdmissionOutcome::RejectedCapitalExhausted,
                format!("target {target} below one lot cost {lot_cost}"),
            );
        }

        // 5. Size
        let affordable = self.affordable_quantity(price, target);
        let quantity = if signal.suggested_quantity == 0 {
            affordable
        } else {
            round_down_to_lot(signal.suggested_quantity, lot).min(affordable)
        };
        if quantity == 0 {
            return reject(
                AdmissionOutcome::RejectedRiskVeto,
                format!(
                    "quantity hint {} below lot size {lot}",
                    signal.suggested_quantity
                ),
            );
        }

        // 6. Portfolio constraints
        let notional = price.notional(quantity);
        let decision =
            self.risk
                .can_open(self.engine.total_equity(), &self.engine.exposures(), notional);
        if let RiskDecision::Deny { reason } = decision {
            let outcome = if reason.is_holdings_limit() {
                AdmissionOutcome::RejectedPositionLimit
            } else {
                AdmissionOutcome::RejectedRiskVeto
            };
            return reject(outcome, reason.to_string());
        }

        // 7. Submit
        let result = self.engine.submit(
            &symbol,
            OrderSide::Buy,
            OrderKind::Limit,
            quantity,
            price,
            now,
        );
        match result {
            Ok(SubmitResult::Accepted { order_id, .. }) => {
                self.admitted += 1;
                AdmissionDetail {
                    symbol: symbol.clone(),
                    score: signal.score,
                    outcome: AdmissionOutcome::Admitted,
                    reason: signal.reason.clone(),
                    order_id: Some(order_id),
                    quantity,
                    price,
                }
            }
            Ok(SubmitResult::Rejected { reason }) => {
                let outcome = match reason {
                    SubmitRejectReason::InsufficientCash { .. } => {
                        AdmissionOutcome::RejectedCapitalExhausted
                    }
                    SubmitRejectReason::DuplicateInFlight { .. } => {
                        AdmissionOutcome::RejectedDuplicatePosition
                    }
                    _ => AdmissionOutcome::RejectedRiskVeto,
                };
                reject(outcome, format!("engine: {reason}"))
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Engine refused admitted signal");
                reject(AdmissionOutcome::RejectedRiskVeto, format!("engine: {e}"))
            }
        }
    }

    /// Largest lot multiple whose estimated cost fits in `target`.
    fn affordable_quantity(&self, price: Price, target: Decimal) -> u64 {
        let lot = self.engine.config().lot_size;
        let shares = (target / price.inner()).floor().to_u64().unwrap_or(0);
        let mut quantity = round_down_to_lot(shares, lot);
        while quantity > 0 && self.engine.estimated_cost(price, quantity) > target {
            quantity -= lot;
        }
        quantity
    }
}
