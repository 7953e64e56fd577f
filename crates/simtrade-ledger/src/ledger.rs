//! The account ledger.
//!
//! # Accounting
//!
//! - BUY: `cash -= qty * price + commission`; cost basis grows by `qty * price`.
//! - SELL: `cash += qty * price - commission`; cost basis shrinks by
//!   `qty * avg_cost`; realized P&L grows by `(price - avg_cost) * qty`.
//!
//! Hence `cash + Σ cost_basis` moves only by `realized_pnl - commission`
//! on every fill.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use simtrade_core::{Order, OrderId, OrderSide, Price};

use crate::config::AccountConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::position::Position;

// ============================================================================
// Fill
// ============================================================================

/// One execution handed to the ledger by the order engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub price: Price,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// `quantity * price`.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price.notional(self.quantity)
    }

    /// Net cash movement: negative for BUY, positive for SELL.
    #[must_use]
    pub fn cash_delta(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission),
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}

// ============================================================================
// AccountStatus
// ============================================================================

/// Read-only reporting projection of the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub cash_balance: Decimal,
    /// Cash not reserved by in-flight BUY orders.
    pub available_cash: Decimal,
    pub total_market_value: Decimal,
    pub total_equity: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub commissions_paid: Decimal,
    pub position_count: usize,
    pub pending_order_count: usize,
    pub session: u64,
}

impl AccountStatus {
    /// Overlay order-engine state onto a ledger-only snapshot.
    #[must_use]
    pub fn with_orders(mut self, pending_order_count: usize, reserved_cash: Decimal) -> Self {
        self.pending_order_count = pending_order_count;
        self.available_cash = self.cash_balance - reserved_cash;
        self
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Cash, positions and history for one simulated account.
#[derive(Debug, Clone)]
pub struct Ledger {
    config: AccountConfig,
    cash: Decimal,
    positions: BTreeMap<String, Position>,
    order_history: Vec<Order>,
    fills: Vec<Fill>,
    realized_pnl: Decimal,
    commissions_paid: Decimal,
    session: u64,
}

impl Ledger {
    /// Create a ledger funded with `config.initial_capital`.
    pub fn new(config: AccountConfig) -> Self {
        info!(
            initial_capital = %config.initial_capital,
            commission_rate = %config.commission_rate,
            t_plus_one = config.t_plus_one,
            "Ledger created"
        );
        Self {
            cash: config.initial_capital,
            config,
            positions: BTreeMap::new(),
            order_history: Vec::new(),
            fills: Vec::new(),
            realized_pnl: Decimal::ZERO,
            commissions_paid: Decimal::ZERO,
            session: 0,
        }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    // === Mutators ===

    /// Apply one fill. Returns the P&L realized by it (zero for BUY).
    ///
    /// Fails without touching state when a BUY is not affordable or a SELL
    /// exceeds the sellable quantity.
    pub fn apply_fill(&mut self, fill: &Fill) -> LedgerResult<Decimal> {
        if fill.quantity == 0 {
            return Err(LedgerError::InvalidFill(format!(
                "{} fill for {} has zero quantity",
                fill.side, fill.symbol
            )));
        }
        if !fill.price.is_positive() || fill.commission.is_sign_negative() {
            return Err(LedgerError::InvalidFill(format!(
                "{} fill for {} has price {} commission {}",
                fill.side, fill.symbol, fill.price, fill.commission
            )));
        }

        let realized = match fill.side {
            OrderSide::Buy => {
                self.apply_buy(fill)?;
                Decimal::ZERO
            }
            OrderSide::Sell => self.apply_sell(fill)?,
        };

        self.commissions_paid += fill.commission;
        self.fills.push(fill.clone());
        Ok(realized)
    }

    fn apply_buy(&mut self, fill: &Fill) -> LedgerResult<()> {
        let required = fill.notional() + fill.commission;
        if required > self.cash {
            return Err(LedgerError::InsufficientCash {
                required,
                available: self.cash,
            });
        }

        self.cash += fill.cash_delta();
        let lock = self.config.t_plus_one;
        let session = self.session;
        let position = self
            .positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Position::open(&fill.symbol, 0, fill.price, fill.timestamp, session));
        position.add(fill.quantity, fill.price, lock, fill.timestamp);

        debug!(
            symbol = %fill.symbol,
            quantity = fill.quantity,
            price = %fill.price,
            avg_cost = %position.avg_cost,
            locked = position.locked_quantity,
            cash = %self.cash,
            "BUY fill applied"
        );
        Ok(())
    }

    fn apply_sell(&mut self, fill: &Fill) -> LedgerResult<Decimal> {
        let sellable = self.sellable(&fill.symbol);
        if fill.quantity > sellable {
            return Err(LedgerError::InsufficientSellable {
                symbol: fill.symbol.clone(),
                requested: fill.quantity,
                sellable,
            });
        }

        let Some(position) = self.positions.get_mut(&fill.symbol) else {
            return Err(LedgerError::InsufficientSellable {
                symbol: fill.symbol.clone(),
                requested: fill.quantity,
                sellable: 0,
            });
        };

        let released = position.reduce(fill.quantity, fill.price, fill.timestamp);
        let realized = fill.notional() - released;
        let closed = position.is_empty();

        self.cash += fill.cash_delta();
        self.realized_pnl += realized;

        if closed {
            self.positions.remove(&fill.symbol);
            info!(symbol = %fill.symbol, realized = %realized, "Position closed");
        } else {
            debug!(
                symbol = %fill.symbol,
                quantity = fill.quantity,
                price = %fill.price,
                realized = %realized,
                "SELL fill applied"
            );
        }

        Ok(realized)
    }

    /// Session boundary: every locked share becomes sellable.
    pub fn roll_session(&mut self) {
        let mut unlocked = 0u64;
        for position in self.positions.values_mut() {
            unlocked += position.locked_quantity;
            position.locked_quantity = 0;
        }
        self.session += 1;
        info!(session = self.session, unlocked, "Session rolled");
    }

    /// Update a position's mark price. Unknown symbols are ignored.
    pub fn mark(&mut self, symbol: &str, price: Price) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.last_mark_price = price;
        }
    }

    /// Append a terminal order to the history.
    pub fn record_order(&mut self, order: Order) {
        debug_assert!(order.is_terminal(), "only terminal orders are archived");
        self.order_history.push(order);
    }

    // === Queries ===

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn commissions_paid(&self) -> Decimal {
        self.commissions_paid
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    /// Shares of `symbol` that may be sold this session.
    pub fn sellable(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, Position::sellable)
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Σ quantity × last mark.
    pub fn total_market_value(&self) -> Decimal {
        self.positions.values().map(Position::market_value).sum()
    }

    /// Cash plus market value.
    pub fn total_equity(&self) -> Decimal {
        self.cash + self.total_market_value()
    }

    /// Cash plus remaining cost basis; the quantity conserved by fills.
    pub fn book_value(&self) -> Decimal {
        self.cash + self.positions.values().map(|p| p.cost_basis).sum::<Decimal>()
    }

    /// Ledger-only snapshot; order counts are overlaid by the engine.
    pub fn snapshot(&self) -> AccountStatus {
        let total_market_value = self.total_market_value();
        AccountStatus {
            cash_balance: self.cash,
            available_cash: self.cash,
            total_market_value,
            total_equity: self.cash + total_market_value,
            unrealized_pnl: self.positions.values().map(Position::unrealized_pnl).sum(),
            realized_pnl: self.realized_pnl,
            commissions_paid: self.commissions_paid,
            position_count: self.positions.len(),
            pending_order_count: 0,
            session: self.session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger(t_plus_one: bool) -> Ledger {
        Ledger::new(AccountConfig {
            initial_capital: dec!(100000),
            commission_rate: dec!(0.0003),
            min_commission: Decimal::ZERO,
            t_plus_one,
        })
    }

    fn fill(id: u64, symbol: &str, side: OrderSide, qty: u64, px: Decimal) -> Fill {
        let commission = Price::new(px).notional(qty) * dec!(0.0003);
        Fill {
            order_id: OrderId(id),
            symbol: symbol.to_string(),
            side,
            quantity: qty,
            price: Price::new(px),
            commission,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_buy_debits_cash_and_locks() {
        let mut ledger = ledger(true);
        ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)))
            .unwrap();

        // 10_000 + 3 commission
        assert_eq!(ledger.cash(), dec!(89997));
        let pos = ledger.position("600000").unwrap();
        assert_eq!(pos.quantity, 1_000);
        assert_eq!(pos.locked_quantity, 1_000);
        assert_eq!(ledger.sellable("600000"), 0);
        assert_eq!(ledger.commissions_paid(), dec!(3));
    }

    #[test]
    fn test_cash_moves_by_fill_cash_delta() {
        let mut ledger = ledger(false);
        let buy = fill(1, "600000", OrderSide::Buy, 1_000, dec!(10));
        let sell = fill(2, "600000", OrderSide::Sell, 1_000, dec!(11));
        assert_eq!(buy.cash_delta(), dec!(-10003));
        assert_eq!(sell.cash_delta(), dec!(10996.7));

        ledger.apply_fill(&buy).unwrap();
        ledger.apply_fill(&sell).unwrap();
        assert_eq!(ledger.cash(), dec!(100000) - dec!(10003) + dec!(10996.7));
    }

    #[test]
    fn test_t_plus_zero_does_not_lock() {
        let mut ledger = ledger(false);
        ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)))
            .unwrap();
        assert_eq!(ledger.sellable("600000"), 1_000);
    }

    #[test]
    fn test_sell_locked_rejected_until_roll() {
        let mut ledger = ledger(true);
        ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)))
            .unwrap();

        let sell = fill(2, "600000", OrderSide::Sell, 1_000, dec!(11));
        let err = ledger.apply_fill(&sell).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientSellable { sellable: 0, .. }));
        // State untouched by the failed fill
        assert_eq!(ledger.fills().len(), 1);

        ledger.roll_session();
        let realized = ledger.apply_fill(&sell).unwrap();
        assert_eq!(realized, dec!(1000));
        assert!(!ledger.has_position("600000"));
        assert_eq!(ledger.realized_pnl(), dec!(1000));
    }

    #[test]
    fn test_partial_sell_keeps_avg_cost() {
        let mut ledger = ledger(false);
        ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)))
            .unwrap();
        ledger
            .apply_fill(&fill(2, "600000", OrderSide::Buy, 1_000, dec!(12)))
            .unwrap();
        assert_eq!(ledger.position("600000").unwrap().avg_cost, Price::new(dec!(11)));

        let realized = ledger
            .apply_fill(&fill(3, "600000", OrderSide::Sell, 500, dec!(9)))
            .unwrap();
        assert_eq!(realized, dec!(-1000));
        let pos = ledger.position("600000").unwrap();
        assert_eq!(pos.quantity, 1_500);
        assert_eq!(pos.avg_cost, Price::new(dec!(11)));
    }

    #[test]
    fn test_buy_unaffordable_is_error() {
        let mut ledger = ledger(true);
        let err = ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 10_000, dec!(10)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientCash { .. }));
        assert_eq!(ledger.cash(), dec!(100000));
        assert_eq!(ledger.position_count(), 0);
    }

    #[test]
    fn test_conservation_over_fill_sequence() {
        let mut ledger = ledger(false);
        let fills = [
            fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)),
            fill(2, "000001", OrderSide::Buy, 2_000, dec!(12.5)),
            fill(3, "600000", OrderSide::Buy, 500, dec!(10.6)),
            fill(4, "600000", OrderSide::Sell, 700, dec!(11.2)),
            fill(5, "000001", OrderSide::Sell, 2_000, dec!(12.1)),
            fill(6, "600000", OrderSide::Sell, 800, dec!(9.8)),
        ];

        for f in &fills {
            let before = ledger.book_value();
            let realized = ledger.apply_fill(f).unwrap();
            let after = ledger.book_value();
            let expected = realized - f.commission;
            assert!(
                (after - before - expected).abs() < dec!(0.000001),
                "fill {} broke conservation: {} vs {}",
                f.order_id,
                after - before,
                expected
            );
        }

        assert_eq!(ledger.position_count(), 0);
        assert_eq!(ledger.total_equity(), ledger.cash());
    }

    #[test]
    fn test_snapshot_equity_identity() {
        let mut ledger = ledger(true);
        ledger
            .apply_fill(&fill(1, "600000", OrderSide::Buy, 1_000, dec!(10)))
            .unwrap();
        ledger.mark("600000", Price::new(dec!(10.5)));

        let status = ledger.snapshot();
        assert_eq!(status.total_market_value, dec!(10500));
        assert_eq!(status.total_equity, status.cash_balance + status.total_market_value);
        assert_eq!(status.unrealized_pnl, dec!(500));
        assert_eq!(status.position_count, 1);

        let overlaid = status.with_orders(2, dec!(1000));
        assert_eq!(overlaid.pending_order_count, 2);
        assert_eq!(overlaid.available_cash, dec!(88997));
    }

    #[test]
    fn test_roll_session_increments_counter() {
        let mut ledger = ledger(true);
        assert_eq!(ledger.session(), 0);
        ledger.roll_session();
        ledger.roll_session();
        assert_eq!(ledger.session(), 2);
    }
}
