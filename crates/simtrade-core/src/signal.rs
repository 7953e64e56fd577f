//! Trade proposals produced by strategy code.

use serde::{Deserialize, Serialize};

use crate::Price;

/// A scored candidate trade.
///
/// Transient: produced and consumed within one admission cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    /// Higher is more attractive.
    pub score: f64,
    pub suggested_price: Price,
    /// Quantity hint in shares; zero lets the admission size the order.
    #[serde(default)]
    pub suggested_quantity: u64,
    /// Market-pattern label used for the hard scenario veto.
    #[serde(default)]
    pub scenario_tag: Option<String>,
    /// Free-text provenance.
    #[serde(default)]
    pub reason: String,
}

impl Signal {
    pub fn new(
        symbol: impl Into<String>,
        score: f64,
        suggested_price: Price,
        suggested_quantity: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            score,
            suggested_price,
            suggested_quantity,
            scenario_tag: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn with_scenario(mut self, tag: impl Into<String>) -> Self {
        self.scenario_tag = Some(tag.into());
        self
    }
}
