//! Exit scanning over held positions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use simtrade_core::{round_down_to_lot, OrderId, OrderKind, OrderSide, Price};
use simtrade_engine::{OrderEngine, SubmitResult};
use simtrade_risk::{ExitReason, RiskControlManager};
use simtrade_telemetry::Metrics;

use crate::error::AppResult;

/// A SELL submitted because an exit rule fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitOrder {
    pub order_id: OrderId,
    pub symbol: String,
    pub quantity: u64,
    pub reason: ExitReason,
    pub return_pct: Decimal,
}

/// Evaluates price and time stops and submits MARKET sells.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitScanner;

impl ExitScanner {
    pub fn new() -> Self {
        Self
    }

    /// Check every held position and sell the sellable quantity of those
    /// that hit a stop.
    ///
    /// Positions with nothing sellable (T+1 lock) or with an order already
    /// in flight are skipped.
    pub fn scan(
        &self,
        engine: &mut OrderEngine,
        risk: &RiskControlManager,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ExitOrder>> {
        let lot_size = engine.config().lot_size;
        let candidates: Vec<(String, u64, Price, Price, NaiveDate)> = engine
            .ledger()
            .positions()
            .map(|p| {
                (
                    p.symbol.clone(),
                    round_down_to_lot(p.sellable(), lot_size),
                    p.avg_cost,
                    p.last_mark_price,
                    p.opened_at.date_naive(),
                )
            })
            .collect();

        let mut exits = Vec::new();
        for (symbol, quantity, entry, mark, entry_date) in candidates {
            if quantity == 0 || engine.has_in_flight(&symbol) {
                debug!(symbol = %symbol, quantity, "Exit check skipped");
                continue;
            }

            let decision = risk.check_exit(entry, mark, entry_date, today)?;
            if !decision.should_exit {
                continue;
            }

            match engine.submit(&symbol, OrderSide::Sell, OrderKind::Market, quantity, mark, now)? {
                SubmitResult::Accepted { order_id, .. } => {
                    Metrics::exit_triggered(&decision.reason.to_string());
                    info!(
                        symbol = %symbol,
                        order_id = %order_id,
                        quantity,
                        reason = %decision.reason,
                        holding_days = decision.holding_days,
                        return_pct = %decision.return_pct,
                        "Exit order submitted"
                    );
                    exits.push(ExitOrder {
                        order_id,
                        symbol,
                        quantity,
                        reason: decision.reason,
                        return_pct: decision.return_pct,
                    });
                }
                SubmitResult::Rejected { reason } => {
                    warn!(symbol = %symbol, reason = %reason, "Exit order rejected");
                }
            }
        }
        Ok(exits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use simtrade_core::Quote;
    use simtrade_engine::EngineConfig;
    use simtrade_ledger::AccountConfig;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, 2, 0, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn holding(symbol: &str, price: Price) -> OrderEngine {
        let mut engine = OrderEngine::new(EngineConfig::default(), AccountConfig::default());
        let id = engine
            .submit(symbol, OrderSide::Buy, OrderKind::Market, 1_000, price, at(9))
            .unwrap()
            .order_id()
            .unwrap();
        engine
            .fill(id, &Quote::new(symbol, price, at(9)), at(9))
            .unwrap();
        engine
    }

    #[test]
    fn test_locked_position_not_exited() {
        let mut engine = holding("600000", Price::new(dec!(10)));
        engine.mark(&Quote::new("600000", Price::new(dec!(9)), at(9)));

        let exits = ExitScanner::new()
            .scan(&mut engine, &RiskControlManager::default(), d(9), at(9))
            .unwrap();
        assert!(exits.is_empty());
    }

    #[test]
    fn test_price_stop_submits_sell() {
        let mut engine = holding("600000", Price::new(dec!(10)));
        engine.roll_session();
        engine.mark(&Quote::new("600000", Price::new(dec!(9.40)), at(10)));

        let exits = ExitScanner::new()
            .scan(&mut engine, &RiskControlManager::default(), d(10), at(10))
            .unwrap();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].reason, ExitReason::PriceStop);
        assert_eq!(exits[0].quantity, 1_000);
        assert!(engine.has_in_flight("600000"));

        // Second scan sees the in-flight sell and does nothing
        let again = ExitScanner::new()
            .scan(&mut engine, &RiskControlManager::default(), d(10), at(10))
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_time_stop_after_max_days() {
        let mut engine = holding("600000", Price::new(dec!(10)));
        engine.roll_session();
        engine.mark(&Quote::new("600000", Price::new(dec!(11)), at(16)));

        // Mon 9th to Mon 16th is five trading days
        let exits = ExitScanner::new()
            .scan(&mut engine, &RiskControlManager::default(), d(16), at(16))
            .unwrap();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].reason, ExitReason::TimeStop);
    }

    #[test]
    fn test_healthy_position_held() {
        let mut engine = holding("600000", Price::new(dec!(10)));
        engine.roll_session();
        engine.mark(&Quote::new("600000", Price::new(dec!(10.30)), at(10)));

        let exits = ExitScanner::new()
            .scan(&mut engine, &RiskControlManager::default(), d(10), at(10))
            .unwrap();
        assert!(exits.is_empty());
    }
}
