//! Normalized price input.
//!
//! External feeds deliver ticks in their own shape. `QuoteGateway` turns a
//! raw tick into a `Quote` whose staleness contract the order engine relies
//! on: continuous-session quotes must be fresh, call-auction quotes are
//! exempt because they are only published a few times per minute.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::instrument::normalize_symbol;
use crate::Price;

/// Market session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionPhase {
    /// Pre-open call auction.
    Auction,
    /// Continuous trading.
    Continuous,
}

impl SessionPhase {
    /// Whether quotes in this phase are exempt from the staleness guard.
    #[must_use]
    pub fn exempt_from_staleness(&self) -> bool {
        matches!(self, Self::Auction)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auction => write!(f, "AUCTION"),
            Self::Continuous => write!(f, "CONTINUOUS"),
        }
    }
}

impl FromStr for SessionPhase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auction" | "call_auction" | "pre_open" | "preopen" => Ok(Self::Auction),
            "continuous" | "trading" | "open" => Ok(Self::Continuous),
            other => Err(CoreError::UnknownSessionPhase(other.to_string())),
        }
    }
}

/// A price observation for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
    pub session_phase: SessionPhase,
    /// Shares available at this price, when the feed reports it.
    #[serde(default)]
    pub volume: Option<u64>,
}

impl Quote {
    /// Create a continuous-session quote without a volume figure.
    pub fn new(symbol: impl Into<String>, price: Price, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            session_phase: SessionPhase::Continuous,
            volume: None,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: SessionPhase) -> Self {
        self.session_phase = phase;
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Age of this quote relative to `now` in milliseconds.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds()
    }

    /// Whether this quote is too old to execute against.
    ///
    /// Auction-phase quotes are never stale.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_ms: i64) -> bool {
        if self.session_phase.exempt_from_staleness() {
            return false;
        }
        self.age_ms(now) > max_age_ms
    }
}

/// Raw tick as delivered by a market data collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTick {
    /// Exchange code, possibly suffixed (`600000.SH`).
    pub code: String,
    /// Last traded price as text.
    pub last: String,
    /// Exchange timestamp in Unix milliseconds.
    pub ts_ms: i64,
    /// Phase label (`auction`, `call_auction`, `continuous`, ...).
    pub phase: String,
    #[serde(default)]
    pub volume: Option<u64>,
}

/// Normalizes raw ticks into `Quote`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteGateway;

impl QuoteGateway {
    pub fn new() -> Self {
        Self
    }

    /// Convert a raw tick into a quote.
    ///
    /// Fails on non-positive prices, unparseable numbers, unknown phases and
    /// out-of-range timestamps.
    pub fn normalize(&self, raw: &RawTick) -> Result<Quote> {
        let symbol = normalize_symbol(&raw.code);
        if symbol.is_empty() {
            return Err(CoreError::InvalidSymbol(raw.code.clone()));
        }

        let price: Price = raw.last.parse()?;
        if !price.is_positive() {
            return Err(CoreError::InvalidPrice(raw.last.clone()));
        }

        let timestamp = Utc
            .timestamp_millis_opt(raw.ts_ms)
            .single()
            .ok_or(CoreError::InvalidTimestamp(raw.ts_ms))?;

        let session_phase = raw.phase.parse()?;

        Ok(Quote {
            symbol,
            price,
            timestamp,
            session_phase,
            volume: raw.volume,
        })
    }
}
