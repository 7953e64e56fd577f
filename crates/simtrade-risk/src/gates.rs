//! Risk gate rules.
//!
//! # Entry rules
//!
//! - ScenarioVeto: signal carries a banned scenario tag (checked first, non-overridable)
//! - MaxHoldings: number of held symbols already at the limit
//! - PositionCap: an existing exposure exceeds the per-stock share of equity
//! - NewPositionCap: the proposed position would exceed the per-stock share
//!
//! # Exit rules (first match wins)
//!
//! - PriceStop: return from entry at or below `price_stop_pct`
//! - TimeStop: held `time_stop_min_days` without reaching `time_stop_min_profit_pct`,
//!   or held `time_stop_max_days` regardless of return
//!
//! The manager holds configuration only; every check is a pure function of
//! its arguments.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use simtrade_core::{trading_days_between, Price};

use crate::error::{RiskError, RiskResult};

// ============================================================================
// Configuration
// ============================================================================

/// Risk gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Scenario tags that veto a signal outright. Matched case-insensitively.
    #[serde(default = "default_banned_scenarios")]
    pub banned_scenarios: BTreeSet<String>,
    /// Maximum number of distinct symbols held (including in-flight BUYs).
    #[serde(default = "default_max_holdings")]
    pub max_holdings: usize,
    /// Maximum notional per symbol as a fraction of total equity.
    #[serde(default = "default_max_position_per_stock")]
    pub max_position_per_stock: Decimal,
    /// Exit when the return from entry falls to this level (negative).
    #[serde(default = "default_price_stop_pct")]
    pub price_stop_pct: Decimal,
    #[serde(default = "default_time_stop_min_days")]
    pub time_stop_min_days: i64,
    /// Return a position must reach by `time_stop_min_days` to be kept.
    #[serde(default = "default_time_stop_min_profit_pct")]
    pub time_stop_min_profit_pct: Decimal,
    /// Unconditional exit after this many trading days.
    #[serde(default = "default_time_stop_max_days")]
    pub time_stop_max_days: i64,
}

fn default_banned_scenarios() -> BTreeSet<String> {
    ["tail_rally_exhaustion", "pump_and_dump", "limit_up_open_trap"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_holdings() -> usize {
    5
}

fn default_max_position_per_stock() -> Decimal {
    Decimal::new(2, 1) // 0.2
}

fn default_price_stop_pct() -> Decimal {
    Decimal::new(-5, 2) // -5%
}

fn default_time_stop_min_days() -> i64 {
    3
}

fn default_time_stop_min_profit_pct() -> Decimal {
    Decimal::new(5, 2) // +5%
}

fn default_time_stop_max_days() -> i64 {
    5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            banned_scenarios: default_banned_scenarios(),
            max_holdings: default_max_holdings(),
            max_position_per_stock: default_max_position_per_stock(),
            price_stop_pct: default_price_stop_pct(),
            time_stop_min_days: default_time_stop_min_days(),
            time_stop_min_profit_pct: default_time_stop_min_profit_pct(),
            time_stop_max_days: default_time_stop_max_days(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if self.max_holdings == 0 {
            return Err(RiskError::ConfigError("max_holdings must be > 0".to_string()));
        }
        if self.max_position_per_stock <= Decimal::ZERO || self.max_position_per_stock > Decimal::ONE
        {
            return Err(RiskError::ConfigError(format!(
                "max_position_per_stock must be in (0, 1], got {}",
                self.max_position_per_stock
            )));
        }
        if self.price_stop_pct >= Decimal::ZERO {
            return Err(RiskError::ConfigError(format!(
                "price_stop_pct must be negative, got {}",
                self.price_stop_pct
            )));
        }
        if self.time_stop_min_days < 0 || self.time_stop_max_days < self.time_stop_min_days {
            return Err(RiskError::ConfigError(format!(
                "time stop days must satisfy 0 <= min ({}) <= max ({})",
                self.time_stop_min_days, self.time_stop_max_days
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Decisions
// ============================================================================

/// Why an entry was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RiskReason {
    ScenarioVetoed { tag: String },
    MaxHoldings { held: usize, max: usize },
    PositionCapExceeded { symbol: String, notional: Decimal, cap: Decimal },
    NewPositionCapExceeded { notional: Decimal, cap: Decimal },
}

impl RiskReason {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ScenarioVetoed { .. } => "scenario_vetoed",
            Self::MaxHoldings { .. } => "max_holdings",
            Self::PositionCapExceeded { .. } => "position_cap_exceeded",
            Self::NewPositionCapExceeded { .. } => "new_position_cap_exceeded",
        }
    }

    /// Whether this denial is about the number of holdings rather than size.
    pub fn is_holdings_limit(&self) -> bool {
        matches!(self, Self::MaxHoldings { .. })
    }
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScenarioVetoed { tag } => write!(f, "scenario '{tag}' is vetoed"),
            Self::MaxHoldings { held, max } => write!(f, "holding {held} symbols, max {max}"),
            Self::PositionCapExceeded { symbol, notional, cap } => {
                write!(f, "{symbol} exposure {notional} exceeds cap {cap}")
            }
            Self::NewPositionCapExceeded { notional, cap } => {
                write!(f, "new position {notional} exceeds cap {cap}")
            }
        }
    }
}

/// Outcome of an entry check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    Allow,
    Deny { reason: RiskReason },
}

impl RiskDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason(&self) -> Option<&RiskReason> {
        match self {
            Self::Allow => None,
            Self::Deny { reason } => Some(reason),
        }
    }

    fn deny(reason: RiskReason) -> Self {
        Self::Deny { reason }
    }
}

/// Notional committed to one symbol: an open position or an in-flight BUY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    pub symbol: String,
    pub notional: Decimal,
}

impl Exposure {
    pub fn new(symbol: impl Into<String>, notional: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            notional,
        }
    }
}

/// Why a held position should be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    None,
    PriceStop,
    TimeStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::PriceStop => write!(f, "PRICE_STOP"),
            Self::TimeStop => write!(f, "TIME_STOP"),
        }
    }
}

/// Result of [`RiskControlManager::check_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitDecision {
    pub should_exit: bool,
    pub reason: ExitReason,
    /// Trading days held.
    pub holding_days: i64,
    /// `(current - entry) / entry`.
    pub return_pct: Decimal,
}

impl ExitDecision {
    fn hold(holding_days: i64, return_pct: Decimal) -> Self {
        Self {
            should_exit: false,
            reason: ExitReason::None,
            holding_days,
            return_pct,
        }
    }

    fn exit(reason: ExitReason, holding_days: i64, return_pct: Decimal) -> Self {
        Self {
            should_exit: true,
            reason,
            holding_days,
            return_pct,
        }
    }
}

// ============================================================================
// RiskControlManager
// ============================================================================

/// Stateless risk evaluator.
#[derive(Debug, Clone)]
pub struct RiskControlManager {
    config: RiskConfig,
    /// Banned tags normalized to trimmed lowercase.
    banned: BTreeSet<String>,
}

impl Default for RiskControlManager {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskControlManager {
    pub fn new(config: RiskConfig) -> Self {
        let banned = config
            .banned_scenarios
            .iter()
            .map(|tag| normalize_tag(tag))
            .filter(|tag| !tag.is_empty())
            .collect();
        Self { config, banned }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Hard scenario veto. Runs before any capital or position check.
    pub fn can_open_by_scenario(
        &self,
        symbol: &str,
        scenario_tag: Option<&str>,
    ) -> RiskResult<RiskDecision> {
        if symbol.trim().is_empty() {
            return Err(RiskError::InvalidSymbol(symbol.to_string()));
        }

        let Some(tag) = scenario_tag else {
            return Ok(RiskDecision::Allow);
        };
        let normalized = normalize_tag(tag);
        if self.banned.contains(&normalized) {
            debug!(symbol, tag = %normalized, "Scenario veto");
            return Ok(RiskDecision::deny(RiskReason::ScenarioVetoed { tag: normalized }));
        }
        Ok(RiskDecision::Allow)
    }

    /// Holdings count and per-stock cap over existing exposures.
    ///
    /// Exposures for the same symbol are summed and counted once.
    pub fn check_portfolio_constraints(
        &self,
        total_equity: Decimal,
        open_positions: &[Exposure],
    ) -> RiskDecision {
        let mut by_symbol: BTreeMap<&str, Decimal> = BTreeMap::new();
        for exposure in open_positions {
            *by_symbol.entry(exposure.symbol.as_str()).or_default() += exposure.notional;
        }

        if by_symbol.len() >= self.config.max_holdings {
            return RiskDecision::deny(RiskReason::MaxHoldings {
                held: by_symbol.len(),
                max: self.config.max_holdings,
            });
        }

        let cap = self.per_stock_cap(total_equity);
        if let Some((symbol, notional)) = by_symbol.iter().find(|(_, n)| **n > cap) {
            return RiskDecision::deny(RiskReason::PositionCapExceeded {
                symbol: (*symbol).to_string(),
                notional: *notional,
                cap,
            });
        }

        RiskDecision::Allow
    }

    /// Portfolio constraints plus the cap on the new position itself.
    pub fn can_open(
        &self,
        total_equity: Decimal,
        open_positions: &[Exposure],
        new_position_notional: Decimal,
    ) -> RiskDecision {
        let portfolio = self.check_portfolio_constraints(total_equity, open_positions);
        if !portfolio.is_allowed() {
            return portfolio;
        }

        let cap = self.per_stock_cap(total_equity);
        if new_position_notional > cap {
            return RiskDecision::deny(RiskReason::NewPositionCapExceeded {
                notional: new_position_notional,
                cap,
            });
        }

        RiskDecision::Allow
    }

    /// Evaluate exit rules for a held position.
    pub fn check_exit(
        &self,
        entry_price: Price,
        current_price: Price,
        entry_date: NaiveDate,
        current_date: NaiveDate,
    ) -> RiskResult<ExitDecision> {
        if !entry_price.is_positive() {
            return Err(RiskError::InvalidEntryPrice(entry_price.to_string()));
        }
        let holding_days = trading_days_between(entry_date, current_date).ok_or(
            RiskError::DateRegression {
                entry: entry_date,
                current: current_date,
            },
        )?;
        let return_pct = current_price
            .return_from(entry_price)
            .ok_or_else(|| RiskError::InvalidEntryPrice(entry_price.to_string()))?;

        if return_pct <= self.config.price_stop_pct {
            return Ok(ExitDecision::exit(ExitReason::PriceStop, holding_days, return_pct));
        }

        let stalled = holding_days >= self.config.time_stop_min_days
            && return_pct < self.config.time_stop_min_profit_pct;
        if stalled || holding_days >= self.config.time_stop_max_days {
            return Ok(ExitDecision::exit(ExitReason::TimeStop, holding_days, return_pct));
        }

        Ok(ExitDecision::hold(holding_days, return_pct))
    }

    fn per_stock_cap(&self, total_equity: Decimal) -> Decimal {
        total_equity * self.config.max_position_per_stock
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
