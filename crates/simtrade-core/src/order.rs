//! Order-related types and identifiers.
//!
//! Provides order side, kind, lifecycle status and the order record
//! itself. Orders are created and mutated only by the order engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Price;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Market order, filled at the quote price plus slippage.
    Market,
    /// Limit order, filled at its limit price once the quote crosses it.
    Limit,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic order identifier, unique per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord-{}", self.0)
    }
}

/// State of an order in its lifecycle.
///
/// `Pending → {Filled, Partial, Cancelled, Rejected}`, `Partial → {Filled, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted, nothing filled yet.
    #[default]
    Pending,
    /// Partially filled.
    Partial,
    /// Completely filled.
    Filled,
    /// Cancelled by the caller or at session end.
    Cancelled,
    /// Rejected at fill time.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    /// Returns true while the order still occupies the in-flight guard.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Partial | Filled | Cancelled | Rejected) => true,
            (Partial, Partial | Filled | Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An order tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    /// Requested quantity (multiple of the lot size).
    pub quantity: u64,
    /// Present iff `kind == Limit`.
    pub limit_price: Option<Price>,
    /// Reference price at submission (limit price or the caller's market reference).
    pub reference_price: Price,
    pub status: OrderStatus,
    pub filled_quantity: u64,
    /// Volume-weighted average fill price.
    pub filled_price: Price,
    /// Cumulative commission charged on fills.
    pub commission: Decimal,
    /// Cash still reserved for the unfilled remainder (BUY only).
    pub reserved_cash: Decimal,
    /// True when a market order was converted to a limit at the price band.
    pub coerced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Remaining unfilled quantity.
    #[must_use]
    pub fn remaining_quantity(&self) -> u64 {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Notional committed by this order at its reference price.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.limit_price
            .unwrap_or(self.reference_price)
            .notional(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Filled));
        assert!(Pending.can_transition_to(Partial));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Partial.can_transition_to(Filled));
        assert!(Partial.can_transition_to(Cancelled));

        assert!(!Partial.can_transition_to(Rejected));
        assert!(!Partial.can_transition_to(Pending));
        for terminal in [Filled, Cancelled, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Pending, Partial, Filled, Cancelled, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_in_flight_states() {
        assert!(OrderStatus::Pending.is_in_flight());
        assert!(OrderStatus::Partial.is_in_flight());
        assert!(!OrderStatus::Filled.is_in_flight());
    }

    #[test]
    fn test_order_id_display() {
        assert_eq!(OrderId(42).to_string(), "ord-42");
    }

    #[test]
    fn test_status_serde_uppercase() {
        let json = serde_json::to_string(&OrderStatus::Partial).unwrap();
        assert_eq!(json, "\"PARTIAL\"");
    }
}
