//! Shared single-writer handle to one account.
//!
//! Every mutation takes the write lock for its whole duration, so guard
//! release and the terminal transition it depends on are never observed
//! apart. Readers take the read lock and see either the state before or
//! after a mutation, never in between.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use simtrade_core::{Order, OrderId, OrderKind, OrderSide, Price, PriceLimits, Quote};
use simtrade_ledger::{AccountConfig, AccountStatus, Position};

use crate::config::EngineConfig;
use crate::engine::{CancelResult, FillResult, OrderEngine, SubmitResult};
use crate::error::EngineResult;

/// Cloneable handle to an [`OrderEngine`].
#[derive(Debug, Clone)]
pub struct AccountHandle {
    inner: Arc<RwLock<OrderEngine>>,
}

impl AccountHandle {
    pub fn new(engine: OrderEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn from_config(engine: EngineConfig, account: AccountConfig) -> Self {
        Self::new(OrderEngine::new(engine, account))
    }

    // === Mutations (write lock) ===

    pub fn submit(
        &self,
        symbol: &str,
        side: OrderSide,
        kind: OrderKind,
        quantity: u64,
        price: Price,
        now: DateTime<Utc>,
    ) -> EngineResult<SubmitResult> {
        self.inner
            .write()
            .submit(symbol, side, kind, quantity, price, now)
    }

    pub fn fill(
        &self,
        order_id: OrderId,
        quote: &Quote,
        now: DateTime<Utc>,
    ) -> EngineResult<FillResult> {
        self.inner.write().fill(order_id, quote, now)
    }

    pub fn cancel(&self, order_id: OrderId, now: DateTime<Utc>) -> EngineResult<CancelResult> {
        self.inner.write().cancel(order_id, now)
    }

    pub fn mark(&self, quote: &Quote) {
        self.inner.write().mark(quote);
    }

    pub fn roll_session(&self) {
        self.inner.write().roll_session();
    }

    pub fn set_reference_price(&self, symbol: &str, prev_close: Price) -> EngineResult<PriceLimits> {
        self.inner.write().set_reference_price(symbol, prev_close)
    }

    pub fn set_price_limits(&self, symbol: &str, limits: PriceLimits) -> EngineResult<()> {
        self.inner.write().set_price_limits(symbol, limits)
    }

    /// Run `f` under one write lock.
    pub fn with_engine_mut<R>(&self, f: impl FnOnce(&mut OrderEngine) -> R) -> R {
        f(&mut *self.inner.write())
    }

    // === Queries (read lock) ===

    pub fn snapshot(&self) -> AccountStatus {
        self.inner.read().snapshot()
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.inner.read().order(order_id).cloned()
    }

    /// In-flight orders in id order.
    pub fn pending_orders(&self) -> Vec<Order> {
        self.inner.read().pending_orders().cloned().collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.inner.read().ledger().positions().cloned().collect()
    }

    pub fn has_in_flight(&self, symbol: &str) -> bool {
        self.inner.read().has_in_flight(symbol)
    }

    pub fn available_cash(&self) -> Decimal {
        self.inner.read().available_cash()
    }

    /// Run `f` under one read lock.
    pub fn with_engine<R>(&self, f: impl FnOnce(&OrderEngine) -> R) -> R {
        f(&*self.inner.read())
    }
}
