//! Per-account session driver.
//!
//! One session runs: reference prices → marks → exit scan → admission →
//! fills → close. Quotes are awaited without holding the account lock; each
//! engine mutation takes the lock once.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use simtrade_admission::{AdmissionConfig, AdmissionSummary, SignalPool};
use simtrade_core::{OrderId, Price, Signal};
use simtrade_engine::{AccountHandle, FillResult, OrderEngine};
use simtrade_ledger::AccountStatus;
use simtrade_risk::RiskControlManager;

use crate::config::{AppConfig, DeskConfig};
use crate::error::AppResult;
use crate::exits::{ExitOrder, ExitScanner};
use crate::feed::QuoteFeed;

/// Drives one simulated account through trading sessions.
pub struct Desk<F: QuoteFeed> {
    account: AccountHandle,
    risk: RiskControlManager,
    admission: AdmissionConfig,
    config: DeskConfig,
    exits: ExitScanner,
    feed: F,
    pool: SignalPool,
    run_id: Uuid,
}

impl<F: QuoteFeed> Desk<F> {
    /// Validate `config` and build a fresh account.
    pub fn new(config: &AppConfig, feed: F) -> AppResult<Self> {
        config.validate()?;

        let engine = OrderEngine::new(config.engine.clone(), config.account.clone());
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            initial_capital = %config.account.initial_capital,
            t_plus_one = config.account.t_plus_one,
            "Desk initialized"
        );

        Ok(Self {
            account: AccountHandle::new(engine),
            risk: RiskControlManager::new(config.risk.clone()),
            admission: config.admission.clone(),
            config: config.desk.clone(),
            exits: ExitScanner::new(),
            feed,
            pool: SignalPool::new(),
            run_id,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Shared handle for concurrent readers.
    pub fn account(&self) -> &AccountHandle {
        &self.account
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn snapshot(&self) -> AccountStatus {
        self.account.snapshot()
    }

    /// Register previous closes and derive the daily bands.
    pub fn set_reference_prices(&self, prev_close: &BTreeMap<String, Price>) -> AppResult<()> {
        for (symbol, price) in prev_close {
            self.account.set_reference_price(symbol, *price)?;
        }
        Ok(())
    }

    /// Rank and admit a batch of signals.
    pub fn run_admission(
        &mut self,
        signals: impl IntoIterator<Item = Signal>,
        now: DateTime<Utc>,
    ) -> AdmissionSummary {
        for signal in signals {
            self.pool.push(signal);
        }
        let summary = self
            .pool
            .execute(&self.account, &self.risk, &self.admission, now);
        info!(
            run_id = %self.run_id,
            executed = summary.executed,
            rejected = summary.rejected,
            remaining_capital = %summary.remaining_capital,
            "Admission cycle complete"
        );
        summary
    }

    /// Update position marks from the feed. Returns the number marked.
    pub async fn mark_positions(&self) -> AppResult<usize> {
        let symbols: Vec<String> = self
            .account
            .positions()
            .into_iter()
            .map(|p| p.symbol)
            .collect();

        let mut marked = 0;
        for symbol in symbols {
            if let Some(quote) = self.feed.latest(&symbol).await? {
                self.account.mark(&quote);
                marked += 1;
            }
        }
        Ok(marked)
    }

    /// Try to fill every in-flight order against the feed's latest quote.
    ///
    /// Orders without a quote stay pending.
    pub async fn fill_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<FillResult>> {
        let pending = self.account.pending_orders();
        let mut results = Vec::with_capacity(pending.len());

        for order in pending {
            let Some(quote) = self.feed.latest(&order.symbol).await? else {
                debug!(order_id = %order.order_id, symbol = %order.symbol, "No quote for pending order");
                continue;
            };
            results.push(self.account.fill(order.order_id, &quote, now)?);
        }
        Ok(results)
    }

    /// Evaluate exit rules and submit sells for triggered positions.
    pub fn scan_exits(&self, today: NaiveDate, now: DateTime<Utc>) -> AppResult<Vec<ExitOrder>> {
        if !self.config.exit_check_enabled {
            return Ok(Vec::new());
        }
        self.account
            .with_engine_mut(|engine| self.exits.scan(engine, &self.risk, today, now))
    }

    /// Close the session: cancel day orders if configured, then roll T+1
    /// locks. Returns the cancelled order ids.
    pub fn end_session(&self, now: DateTime<Utc>) -> AppResult<Vec<OrderId>> {
        let cancelled = if self.config.cancel_unfilled_at_close {
            self.account
                .with_engine_mut(|engine| engine.cancel_open_orders(now))?
        } else {
            Vec::new()
        };
        self.account.roll_session();

        let status = self.account.snapshot();
        info!(
            run_id = %self.run_id,
            session = status.session,
            cancelled = cancelled.len(),
            cash = %status.cash_balance,
            equity = %status.total_equity,
            positions = status.position_count,
            "Session closed"
        );
        Ok(cancelled)
    }
}
