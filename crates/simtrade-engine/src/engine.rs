//! Order engine.
//!
//! # Submission Check Order
//!
//! 1. Contract (empty symbol, price <= 0, quantity 0) → `Err(InvalidOrder | InvalidPrice)`
//! 2. Lot multiple                                   → Rejected(NotLotMultiple)
//! 3. Duplicate-submission guard                     → Rejected(DuplicateInFlight)
//! 4. Price-limit coercion (MARKET BUY near limit-up / SELL near limit-down
//!    becomes LIMIT at that bound)
//! 5. LIMIT price inside the daily band              → Rejected(OutsidePriceLimits)
//! 6. BUY affordability at the effective price       → Rejected(InsufficientCash)
//! 7. SELL against sellable quantity                 → Rejected(InsufficientSellable)
//! 8. Accept: assign id, insert guard, reserve cash
//!
//! # Fill Check Order
//!
//! 1. Unknown id / symbol mismatch → `Err`
//! 2. Terminal order              → NotFilled(AlreadyTerminal)
//! 3. Stale quote (not auction)   → NotFilled(StaleQuote)
//! 4. LIMIT not reached           → NotFilled(LimitNotReached)
//! 5. Quote volume below one lot  → NotFilled(NoLiquidity)
//! 6. BUY unaffordable at fill    → Rejected(InsufficientCash), order terminal
//! 7. Apply to ledger; Filled or Partial
//!
//! Every terminal transition releases the guard entry and the cash
//! reservation before returning.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use simtrade_core::{
    normalize_symbol, round_down_to_lot, Order, OrderId, OrderKind, OrderSide, OrderStatus, Price,
    PriceLimits, Quote,
};
use simtrade_ledger::{AccountConfig, AccountStatus, Fill, Ledger};
use simtrade_risk::Exposure;
use simtrade_telemetry::Metrics;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

// ============================================================================
// Results
// ============================================================================

/// Why a submission was refused. No order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SubmitRejectReason {
    NotLotMultiple { quantity: u64, lot_size: u64 },
    DuplicateInFlight { existing: OrderId },
    InsufficientCash { required: Decimal, available: Decimal },
    InsufficientSellable { requested: u64, sellable: u64 },
    OutsidePriceLimits { price: Price, limits: PriceLimits },
}

impl SubmitRejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotLotMultiple { .. } => "not_lot_multiple",
            Self::DuplicateInFlight { .. } => "duplicate_in_flight",
            Self::InsufficientCash { .. } => "insufficient_cash",
            Self::InsufficientSellable { .. } => "insufficient_sellable",
            Self::OutsidePriceLimits { .. } => "outside_price_limits",
        }
    }
}

impl fmt::Display for SubmitRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLotMultiple { quantity, lot_size } => {
                write!(f, "quantity {quantity} is not a multiple of {lot_size}")
            }
            Self::DuplicateInFlight { existing } => write!(f, "{existing} already in flight"),
            Self::InsufficientCash {
                required,
                available,
            } => write!(f, "requires {required}, available {available}"),
            Self::InsufficientSellable {
                requested,
                sellable,
            } => write!(f, "requested {requested}, sellable {sellable}"),
            Self::OutsidePriceLimits { price, limits } => write!(
                f,
                "price {price} outside [{}, {}]",
                limits.limit_down, limits.limit_up
            ),
        }
    }
}

/// Result of [`OrderEngine::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Accepted {
        order_id: OrderId,
        kind: OrderKind,
        limit_price: Option<Price>,
        /// MARKET order converted to LIMIT at the daily band.
        coerced: bool,
    },
    Rejected {
        reason: SubmitRejectReason,
    },
}

impl SubmitResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Accepted { order_id, .. } => Some(*order_id),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reject_reason(&self) -> Option<&SubmitRejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reason } => Some(reason),
        }
    }
}

/// Why a fill attempt did not execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FillRejectReason {
    AlreadyTerminal { status: OrderStatus },
    StaleQuote { age_ms: i64, max_age_ms: i64 },
    LimitNotReached { limit: Price, quote: Price },
    NoLiquidity,
    InsufficientCash { required: Decimal, available: Decimal },
}

impl FillRejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyTerminal { .. } => "already_terminal",
            Self::StaleQuote { .. } => "stale_quote",
            Self::LimitNotReached { .. } => "limit_not_reached",
            Self::NoLiquidity => "no_liquidity",
            Self::InsufficientCash { .. } => "insufficient_cash",
        }
    }
}

impl fmt::Display for FillRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyTerminal { status } => write!(f, "order already {status}"),
            Self::StaleQuote { age_ms, max_age_ms } => {
                write!(f, "quote age {age_ms}ms exceeds {max_age_ms}ms")
            }
            Self::LimitNotReached { limit, quote } => {
                write!(f, "quote {quote} has not reached limit {limit}")
            }
            Self::NoLiquidity => write!(f, "quote volume below one lot"),
            Self::InsufficientCash {
                required,
                available,
            } => write!(f, "fill requires {required}, available {available}"),
        }
    }
}

/// Result of [`OrderEngine::fill`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillResult {
    /// A fill was applied to the ledger.
    Executed {
        order_id: OrderId,
        status: OrderStatus,
        fill: Fill,
        realized_pnl: Decimal,
    },
    /// Nothing happened; the order is unchanged.
    NotFilled {
        order_id: OrderId,
        reason: FillRejectReason,
    },
    /// The order could not be filled and is now terminal: Rejected, or
    /// Cancelled when part of it had already filled.
    Rejected {
        order_id: OrderId,
        status: OrderStatus,
        reason: FillRejectReason,
    },
}

impl FillResult {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }

    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            Self::Executed { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::NotFilled { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&FillRejectReason> {
        match self {
            Self::Executed { .. } => None,
            Self::NotFilled { reason, .. } | Self::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Result of [`OrderEngine::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResult {
    Cancelled {
        order_id: OrderId,
        filled_quantity: u64,
    },
    /// The order had already reached this terminal state.
    AlreadyResolved(OrderStatus),
}

// ============================================================================
// OrderEngine
// ============================================================================

/// Order engine owning the account ledger.
///
/// All mutation goes through `&mut self`; wrap in [`crate::AccountHandle`]
/// to share across threads.
#[derive(Debug)]
pub struct OrderEngine {
    config: EngineConfig,
    ledger: Ledger,
    /// Pending and Partial orders. Terminal orders move to the ledger history.
    open_orders: BTreeMap<OrderId, Order>,
    /// Duplicate-submission guard: symbol → its in-flight order.
    in_flight: BTreeMap<String, OrderId>,
    limits: BTreeMap<String, PriceLimits>,
    next_order_id: u64,
}

impl OrderEngine {
    pub fn new(config: EngineConfig, account: AccountConfig) -> Self {
        info!(
            lot_size = config.lot_size,
            slippage_pct = %config.slippage_pct,
            max_quote_age_ms = config.max_quote_age_ms,
            "OrderEngine created"
        );
        Self {
            config,
            ledger: Ledger::new(account),
            open_orders: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            limits: BTreeMap::new(),
            next_order_id: 1,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Instrument reference data ===

    /// Register the previous close and derive the daily band from the board.
    pub fn set_reference_price(
        &mut self,
        symbol: &str,
        prev_close: Price,
    ) -> EngineResult<PriceLimits> {
        let symbol = checked_symbol(symbol)?;
        if !prev_close.is_positive() {
            return Err(EngineError::InvalidPrice {
                symbol,
                price: prev_close.to_string(),
            });
        }
        let limits = self.config.board_limits.limits_for(&symbol, prev_close);
        debug!(
            symbol = %symbol,
            prev_close = %prev_close,
            limit_up = %limits.limit_up,
            limit_down = %limits.limit_down,
            "Reference price set"
        );
        self.limits.insert(symbol, limits);
        Ok(limits)
    }

    /// Set the daily band explicitly.
    pub fn set_price_limits(&mut self, symbol: &str, limits: PriceLimits) -> EngineResult<()> {
        let symbol = checked_symbol(symbol)?;
        if !limits.limit_down.is_positive() || limits.limit_down > limits.limit_up {
            return Err(EngineError::InvalidPrice {
                symbol,
                price: format!("[{}, {}]", limits.limit_down, limits.limit_up),
            });
        }
        self.limits.insert(symbol, limits);
        Ok(())
    }

    pub fn price_limits(&self, symbol: &str) -> Option<PriceLimits> {
        self.limits.get(&normalize_symbol(symbol)).copied()
    }

    // === Submit ===

    /// Submit an order.
    ///
    /// `price` is the limit for LIMIT orders and the reference price for
    /// MARKET orders.
    pub fn submit(
        &mut self,
        symbol: &str,
        side: OrderSide,
        kind: OrderKind,
        quantity: u64,
        price: Price,
        now: DateTime<Utc>,
    ) -> EngineResult<SubmitResult> {
        let symbol = checked_symbol(symbol)?;
        if !price.is_positive() {
            return Err(EngineError::InvalidPrice {
                symbol,
                price: price.to_string(),
            });
        }
        if quantity == 0 {
            return Err(EngineError::InvalidOrder(format!(
                "{side} {symbol} with zero quantity"
            )));
        }

        // Gate: lot multiple
        if quantity % self.config.lot_size != 0 {
            return Ok(self.reject_submit(
                &symbol,
                SubmitRejectReason::NotLotMultiple {
                    quantity,
                    lot_size: self.config.lot_size,
                },
            ));
        }

        // Gate: one in-flight order per symbol
        if let Some(existing) = self.in_flight.get(&symbol) {
            return Ok(self.reject_submit(
                &symbol,
                SubmitRejectReason::DuplicateInFlight {
                    existing: *existing,
                },
            ));
        }

        // Coercion: a MARKET order pushing into the band has no opposing liquidity
        let limits = self.limits.get(&symbol).copied();
        let (kind, limit_price, coerced) = match (kind, limits) {
            (OrderKind::Market, Some(limits)) => {
                match limits.near_limit(side, price, self.config.limit_tolerance_pct) {
                    Some(pinned) => {
                        info!(
                            symbol = %symbol,
                            side = %side,
                            reference = %price,
                            pinned = %pinned,
                            "MARKET order coerced to LIMIT at price band"
                        );
                        (OrderKind::Limit, Some(pinned), true)
                    }
                    None => (OrderKind::Market, None, false),
                }
            }
            (OrderKind::Market, None) => (OrderKind::Market, None, false),
            (OrderKind::Limit, _) => (OrderKind::Limit, Some(price), false),
        };

        // Gate: explicit LIMIT price within the band
        if let (false, Some(limit), Some(limits)) = (coerced, limit_price, limits) {
            if !limits.contains(limit) {
                return Ok(self.reject_submit(
                    &symbol,
                    SubmitRejectReason::OutsidePriceLimits {
                        price: limit,
                        limits,
                    },
                ));
            }
        }

        let effective_price = limit_price.unwrap_or(price);
        let reserved_cash = match side {
            OrderSide::Buy => {
                let required = self.estimated_cost(effective_price, quantity);
                let available = self.available_cash();
                if required > available {
                    return Ok(self.reject_submit(
                        &symbol,
                        SubmitRejectReason::InsufficientCash {
                            required,
                            available,
                        },
                    ));
                }
                required
            }
            OrderSide::Sell => {
                let sellable = self
                    .ledger
                    .sellable(&symbol)
                    .saturating_sub(self.in_flight_sell_quantity(&symbol));
                if quantity > sellable {
                    return Ok(self.reject_submit(
                        &symbol,
                        SubmitRejectReason::InsufficientSellable {
                            requested: quantity,
                            sellable,
                        },
                    ));
                }
                Decimal::ZERO
            }
        };

        let order_id = OrderId(self.next_order_id);
        self.next_order_id += 1;

        let order = Order {
            order_id,
            symbol: symbol.clone(),
            side,
            kind,
            quantity,
            limit_price,
            reference_price: effective_price,
            status: OrderStatus::Pending,
            filled_quantity: 0,
            filled_price: Price::ZERO,
            commission: Decimal::ZERO,
            reserved_cash,
            coerced,
            created_at: now,
            updated_at: now,
        };

        self.in_flight.insert(symbol.clone(), order_id);
        self.open_orders.insert(order_id, order);

        if coerced {
            Metrics::order_coerced(side.as_str());
        }
        Metrics::order_submitted(side.as_str(), kind.as_str());
        info!(
            order_id = %order_id,
            symbol = %symbol,
            side = %side,
            kind = %kind,
            quantity,
            price = %effective_price,
            reserved = %reserved_cash,
            "Order accepted"
        );
        self.publish_gauges();

        Ok(SubmitResult::Accepted {
            order_id,
            kind,
            limit_price,
            coerced,
        })
    }

    fn reject_submit(&self, symbol: &str, reason: SubmitRejectReason) -> SubmitResult {
        debug!(symbol, reason = %reason, code = reason.code(), "Order rejected");
        Metrics::order_rejected(reason.code());
        SubmitResult::Rejected { reason }
    }

    // === Fill ===

    /// Attempt to fill an order against a quote.
    pub fn fill(
        &mut self,
        order_id: OrderId,
        quote: &Quote,
        now: DateTime<Utc>,
    ) -> EngineResult<FillResult> {
        let Some(order) = self.open_orders.get(&order_id) else {
            return match self.archived(order_id) {
                Some(archived) => Ok(self.skip_fill(
                    order_id,
                    FillRejectReason::AlreadyTerminal {
                        status: archived.status,
                    },
                )),
                None => Err(EngineError::UnknownOrder(order_id)),
            };
        };

        let quote_symbol = normalize_symbol(&quote.symbol);
        if quote_symbol != order.symbol {
            return Err(EngineError::SymbolMismatch {
                order_id,
                expected: order.symbol.clone(),
                actual: quote_symbol,
            });
        }

        // Gate: staleness (call auction exempt)
        let age_ms = quote.age_ms(now);
        Metrics::quote_age(age_ms);
        if quote.is_stale(now, self.config.max_quote_age_ms) {
            warn!(
                order_id = %order_id,
                symbol = %order.symbol,
                age_ms,
                phase = %quote.session_phase,
                "Stale quote, fill refused"
            );
            return Ok(self.skip_fill(
                order_id,
                FillRejectReason::StaleQuote {
                    age_ms,
                    max_age_ms: self.config.max_quote_age_ms,
                },
            ));
        }

        // Gate: limit reached
        if let Some(limit) = order.limit_price {
            let reached = match order.side {
                OrderSide::Buy => quote.price <= limit,
                OrderSide::Sell => quote.price >= limit,
            };
            if !reached {
                return Ok(self.skip_fill(
                    order_id,
                    FillRejectReason::LimitNotReached {
                        limit,
                        quote: quote.price,
                    },
                ));
            }
        }

        // Gate: liquidity
        let remaining = order.remaining_quantity();
        let fill_quantity = match quote.volume {
            Some(volume) => remaining.min(round_down_to_lot(volume, self.config.lot_size)),
            None => remaining,
        };
        if fill_quantity == 0 {
            return Ok(self.skip_fill(order_id, FillRejectReason::NoLiquidity));
        }

        let fill_price = self.fill_price(order, quote.price);
        let notional = fill_price.notional(fill_quantity);
        let commission = self.ledger.config().commission_for(notional);
        let side = order.side;
        let symbol = order.symbol.clone();

        // Gate: BUY affordability at the fill price
        if side == OrderSide::Buy {
            let required = notional + commission;
            let available = self.available_cash() + order.reserved_cash;
            if required > available {
                warn!(
                    order_id = %order_id,
                    symbol = %symbol,
                    required = %required,
                    available = %available,
                    "BUY unaffordable at fill price, order rejected"
                );
                let status = if order.status == OrderStatus::Partial {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::Rejected
                };
                self.finalize(order_id, status, now)?;
                self.publish_gauges();
                let reason = FillRejectReason::InsufficientCash {
                    required,
                    available,
                };
                Metrics::fill_skipped(reason.code());
                return Ok(FillResult::Rejected {
                    order_id,
                    status,
                    reason,
                });
            }
        }

        let fill = Fill {
            order_id,
            symbol: symbol.clone(),
            side,
            quantity: fill_quantity,
            price: fill_price,
            commission,
            timestamp: now,
        };
        let realized_pnl = self.ledger.apply_fill(&fill)?;
        self.ledger.mark(&symbol, quote.price);

        let status = self.record_fill(order_id, &fill)?;
        if status.is_terminal() {
            self.finalize(order_id, status, now)?;
        }

        Metrics::fill_applied(side.as_str(), if status.is_terminal() { "filled" } else { "partial" });
        info!(
            order_id = %order_id,
            symbol = %symbol,
            side = %side,
            quantity = fill_quantity,
            price = %fill_price,
            commission = %commission,
            realized = %realized_pnl,
            status = %status,
            "Order filled"
        );
        self.publish_gauges();

        Ok(FillResult::Executed {
            order_id,
            status,
            fill,
            realized_pnl,
        })
    }

    fn skip_fill(&self, order_id: OrderId, reason: FillRejectReason) -> FillResult {
        debug!(order_id = %order_id, reason = %reason, "Fill not executed");
        Metrics::fill_skipped(reason.code());
        FillResult::NotFilled { order_id, reason }
    }

    /// LIMIT fills at the limit; MARKET at the quote adjusted for slippage,
    /// kept inside the daily band.
    fn fill_price(&self, order: &Order, quote_price: Price) -> Price {
        if let Some(limit) = order.limit_price {
            return limit;
        }
        let factor = match order.side {
            OrderSide::Buy => Decimal::ONE + self.config.slippage_pct,
            OrderSide::Sell => Decimal::ONE - self.config.slippage_pct,
        };
        let price = (quote_price * factor).round_to_tick();
        match self.limits.get(&order.symbol) {
            Some(limits) => price.clamp(limits.limit_down, limits.limit_up),
            None => price,
        }
    }

    /// Update fill progress on an open order. Returns its new status.
    fn record_fill(&mut self, order_id: OrderId, fill: &Fill) -> EngineResult<OrderStatus> {
        let account = self.ledger.config().clone();
        let order = self
            .open_orders
            .get_mut(&order_id)
            .ok_or(EngineError::UnknownOrder(order_id))?;

        let prior = Decimal::from(order.filled_quantity);
        let filled = prior + Decimal::from(fill.quantity);
        order.filled_price =
            Price::new((order.filled_price.inner() * prior + fill.notional()) / filled);
        order.filled_quantity += fill.quantity;
        order.commission += fill.commission;
        order.updated_at = fill.timestamp;

        let next = if order.remaining_quantity() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
        if !order.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                order_id,
                from: order.status,
                to: next,
            });
        }
        order.status = next;

        if order.side == OrderSide::Buy {
            let remaining_notional = order.reference_price.notional(order.remaining_quantity());
            order.reserved_cash = if order.remaining_quantity() == 0 {
                Decimal::ZERO
            } else {
                remaining_notional + account.commission_for(remaining_notional)
            };
        }
        Ok(next)
    }

    // === Cancel ===

    /// Cancel an in-flight order.
    ///
    /// A late cancel on a terminal order is `AlreadyResolved`, not an error.
    pub fn cancel(&mut self, order_id: OrderId, now: DateTime<Utc>) -> EngineResult<CancelResult> {
        if let Some(archived) = self.archived(order_id) {
            debug!(order_id = %order_id, status = %archived.status, "Cancel on resolved order");
            return Ok(CancelResult::AlreadyResolved(archived.status));
        }
        let filled_quantity = self
            .open_orders
            .get(&order_id)
            .map(|o| o.filled_quantity)
            .ok_or(EngineError::UnknownOrder(order_id))?;

        let order = self.finalize(order_id, OrderStatus::Cancelled, now)?;
        Metrics::order_cancelled(order.side.as_str());
        info!(
            order_id = %order_id,
            symbol = %order.symbol,
            filled_quantity,
            "Order cancelled"
        );
        self.publish_gauges();
        Ok(CancelResult::Cancelled {
            order_id,
            filled_quantity,
        })
    }

    /// Cancel every in-flight order. Returns the cancelled ids.
    pub fn cancel_open_orders(&mut self, now: DateTime<Utc>) -> EngineResult<Vec<OrderId>> {
        let ids: Vec<OrderId> = self.open_orders.keys().copied().collect();
        for id in &ids {
            self.cancel(*id, now)?;
        }
        Ok(ids)
    }

    /// Move an open order to a terminal state, releasing its guard entry and
    /// reservation, and archive it.
    fn finalize(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<Order> {
        let current = self
            .open_orders
            .get(&order_id)
            .map(|o| o.status)
            .ok_or(EngineError::UnknownOrder(order_id))?;
        if current != status && !current.can_transition_to(status) {
            return Err(EngineError::InvalidTransition {
                order_id,
                from: current,
                to: status,
            });
        }

        let mut order = self
            .open_orders
            .remove(&order_id)
            .ok_or(EngineError::UnknownOrder(order_id))?;
        order.status = status;
        order.reserved_cash = Decimal::ZERO;
        order.updated_at = now;

        if self.in_flight.get(&order.symbol) == Some(&order_id) {
            self.in_flight.remove(&order.symbol);
        }
        self.ledger.record_order(order.clone());
        Ok(order)
    }

    // === Account maintenance ===

    /// Update a position's mark from a quote.
    pub fn mark(&mut self, quote: &Quote) {
        self.ledger
            .mark(&normalize_symbol(&quote.symbol), quote.price);
    }

    /// Session boundary: unlock T+1 holdings.
    pub fn roll_session(&mut self) {
        if !self.open_orders.is_empty() {
            warn!(
                open_orders = self.open_orders.len(),
                "Rolling session with orders still in flight"
            );
        }
        self.ledger.roll_session();
        Metrics::session_rolled(self.ledger.session());
        self.publish_gauges();
    }

    // === Queries ===

    /// Look up an order, in flight or archived.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.open_orders
            .get(&order_id)
            .or_else(|| self.archived(order_id))
    }

    fn archived(&self, order_id: OrderId) -> Option<&Order> {
        if order_id.value() >= self.next_order_id {
            return None;
        }
        self.ledger
            .order_history()
            .iter()
            .rev()
            .find(|o| o.order_id == order_id)
    }

    /// In-flight orders in id order.
    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.open_orders.values()
    }

    pub fn pending_order_count(&self) -> usize {
        self.open_orders.len()
    }

    pub fn has_in_flight(&self, symbol: &str) -> bool {
        self.in_flight.contains_key(&normalize_symbol(symbol))
    }

    fn in_flight_sell_quantity(&self, symbol: &str) -> u64 {
        self.open_orders
            .values()
            .filter(|o| o.side == OrderSide::Sell && o.symbol == symbol)
            .map(Order::remaining_quantity)
            .sum()
    }

    /// Cash held back for in-flight BUY orders.
    pub fn reserved_cash(&self) -> Decimal {
        self.open_orders.values().map(|o| o.reserved_cash).sum()
    }

    /// Cash minus reservations.
    pub fn available_cash(&self) -> Decimal {
        self.ledger.cash() - self.reserved_cash()
    }

    /// `quantity * price` plus commission at the ledger's rate and floor.
    pub fn estimated_cost(&self, price: Price, quantity: u64) -> Decimal {
        let notional = price.notional(quantity);
        notional + self.ledger.config().commission_for(notional)
    }

    pub fn total_equity(&self) -> Decimal {
        self.ledger.total_equity()
    }

    /// Open positions at market value plus in-flight BUY orders at their
    /// reference price.
    pub fn exposures(&self) -> Vec<Exposure> {
        let held = self
            .ledger
            .positions()
            .map(|p| Exposure::new(p.symbol.clone(), p.market_value()));
        let pending = self
            .open_orders
            .values()
            .filter(|o| o.side == OrderSide::Buy)
            .map(|o| {
                Exposure::new(
                    o.symbol.clone(),
                    o.reference_price.notional(o.remaining_quantity()),
                )
            });
        held.chain(pending).collect()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Account status including in-flight orders.
    pub fn snapshot(&self) -> AccountStatus {
        self.ledger
            .snapshot()
            .with_orders(self.open_orders.len(), self.reserved_cash())
    }

    fn publish_gauges(&self) {
        Metrics::account_state(
            self.ledger.cash().to_f64().unwrap_or_default(),
            self.ledger.total_equity().to_f64().unwrap_or_default(),
            self.ledger.position_count(),
            self.open_orders.len(),
        );
    }
}

fn checked_symbol(symbol: &str) -> EngineResult<String> {
    let normalized = normalize_symbol(symbol);
    if normalized.is_empty() {
        return Err(EngineError::InvalidOrder(format!(
            "empty symbol {symbol:?}"
        )));
    }
    Ok(normalized)
}
