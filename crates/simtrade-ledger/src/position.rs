//! Open holdings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use simtrade_core::Price;

/// An open long position in one symbol.
///
/// Invariant: `quantity >= locked_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Shares held.
    pub quantity: u64,
    /// Quantity-weighted average purchase price. Changes only on BUY fills.
    pub avg_cost: Price,
    /// Shares bought this session; not sellable until the next roll.
    pub locked_quantity: u64,
    pub last_mark_price: Price,
    /// Remaining cost basis (`quantity * avg_cost` up to rounding).
    pub cost_basis: Decimal,
    /// Time of the first BUY fill.
    pub opened_at: DateTime<Utc>,
    /// Session counter value when opened.
    pub opened_session: u64,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Create a position from an initial BUY fill.
    #[must_use]
    pub fn open(
        symbol: impl Into<String>,
        quantity: u64,
        price: Price,
        at: DateTime<Utc>,
        session: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_cost: price,
            locked_quantity: 0,
            last_mark_price: price,
            cost_basis: price.notional(quantity),
            opened_at: at,
            opened_session: session,
            updated_at: at,
        }
    }

    /// Shares that can be sold now.
    #[must_use]
    pub fn sellable(&self) -> u64 {
        self.quantity.saturating_sub(self.locked_quantity)
    }

    /// Value at the last mark price.
    #[must_use]
    pub fn market_value(&self) -> Decimal {
        self.last_mark_price.notional(self.quantity)
    }

    /// Unrealized P&L at the last mark price.
    #[must_use]
    pub fn unrealized_pnl(&self) -> Decimal {
        self.market_value() - self.cost_basis
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Add a BUY fill and recompute the weighted average cost.
    pub(crate) fn add(&mut self, quantity: u64, price: Price, lock: bool, at: DateTime<Utc>) {
        self.cost_basis += price.notional(quantity);
        self.quantity += quantity;
        if self.quantity > 0 {
            self.avg_cost = Price::new(self.cost_basis / Decimal::from(self.quantity));
        }
        if lock {
            self.locked_quantity += quantity;
        }
        self.last_mark_price = price;
        self.updated_at = at;
    }

    /// Remove sold shares. Returns the cost basis released.
    ///
    /// `avg_cost` is left untouched.
    pub(crate) fn reduce(&mut self, quantity: u64, price: Price, at: DateTime<Utc>) -> Decimal {
        let released = if quantity >= self.quantity {
            self.cost_basis
        } else {
            self.avg_cost.notional(quantity)
        };
        self.cost_basis -= released;
        self.quantity = self.quantity.saturating_sub(quantity);
        self.locked_quantity = self.locked_quantity.min(self.quantity);
        self.last_mark_price = price;
        self.updated_at = at;
        released
    }
}
