//! Admission outcomes and the cycle summary.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use simtrade_core::{OrderId, Price};

/// How one signal was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionOutcome {
    Admitted,
    RejectedDuplicatePosition,
    RejectedCapitalExhausted,
    RejectedPositionLimit,
    RejectedRiskVeto,
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::RejectedDuplicatePosition => "rejected_duplicate_position",
            Self::RejectedCapitalExhausted => "rejected_capital_exhausted",
            Self::RejectedPositionLimit => "rejected_position_limit",
            Self::RejectedRiskVeto => "rejected_risk_veto",
        }
    }
}

impl fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDetail {
    pub symbol: String,
    pub score: f64,
    pub outcome: AdmissionOutcome,
    /// Human-readable explanation; empty only for admissions.
    pub reason: String,
    /// Order created for an admitted signal.
    pub order_id: Option<OrderId>,
    /// Shares ordered (0 unless admitted).
    pub quantity: u64,
    pub price: Price,
}

/// Result of one admission cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionSummary {
    pub executed: usize,
    pub rejected: usize,
    /// Available cash after the cycle.
    pub remaining_capital: Decimal,
    /// One entry per signal, in rank order.
    pub details: Vec<AdmissionDetail>,
}

impl AdmissionSummary {
    pub(crate) fn record(&mut self, detail: AdmissionDetail) {
        if detail.outcome.is_admitted() {
            self.executed += 1;
        } else {
            self.rejected += 1;
        }
        self.details.push(detail);
    }

    /// Symbols admitted in this cycle, in rank order.
    pub fn admitted_symbols(&self) -> Vec<&str> {
        self.details
            .iter()
            .filter(|d| d.outcome.is_admitted())
            .map(|d| d.symbol.as_str())
            .collect()
    }

    pub fn detail(&self, symbol: &str) -> Option<&AdmissionDetail> {
        self.details.iter().find(|d| d.symbol == symbol)
    }

    pub fn count(&self, outcome: AdmissionOutcome) -> usize {
        self.details.iter().filter(|d| d.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_screaming_snake() {
        let json = serde_json::to_string(&AdmissionOutcome::RejectedRiskVeto).unwrap();
        assert_eq!(json, "\"REJECTED_RISK_VETO\"");
    }
}
