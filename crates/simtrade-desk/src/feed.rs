//! Quote sources for the desk.
//!
//! Quotes are awaited outside the account lock and handed to the engine as
//! plain values.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use parking_lot::RwLock;
use tracing::{debug, warn};

use simtrade_core::{normalize_symbol, Quote, QuoteGateway, RawTick};

use crate::error::AppResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Latest-quote lookup.
pub trait QuoteFeed: Send + Sync {
    /// Latest quote for `symbol`, if the feed has one.
    fn latest<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, AppResult<Option<Quote>>>;
}

/// In-memory feed loaded from raw ticks, one batch per session.
#[derive(Debug, Default)]
pub struct ReplayFeed {
    gateway: QuoteGateway,
    quotes: RwLock<BTreeMap<String, Quote>>,
}

impl ReplayFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and store raw ticks. Later ticks for a symbol replace
    /// earlier ones. Returns the number accepted.
    ///
    /// Malformed ticks are skipped with a warning.
    pub fn load(&self, ticks: &[RawTick]) -> usize {
        let mut quotes = self.quotes.write();
        let mut accepted = 0;
        for tick in ticks {
            match self.gateway.normalize(tick) {
                Ok(quote) => {
                    quotes.insert(quote.symbol.clone(), quote);
                    accepted += 1;
                }
                Err(e) => {
                    warn!(code = %tick.code, error = %e, "Dropping malformed tick");
                }
            }
        }
        debug!(accepted, total = ticks.len(), "Ticks loaded");
        accepted
    }

    /// Forget all quotes (session boundary).
    pub fn clear(&self) {
        self.quotes.write().clear();
    }

    pub fn len(&self) -> usize {
        self.quotes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.read().is_empty()
    }
}

impl QuoteFeed for ReplayFeed {
    fn latest<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, AppResult<Option<Quote>>> {
        Box::pin(async move {
            let symbol = normalize_symbol(symbol);
            Ok(self.quotes.read().get(&symbol).cloned())
        })
    }
}
