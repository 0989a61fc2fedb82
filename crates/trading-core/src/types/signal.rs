//! Trade direction and the decision emitted by the signal generator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    #[inline]
    pub fn sign(&self) -> i8 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }

    /// Sign as a float, for indicator math.
    #[inline]
    pub fn sign_f64(&self) -> f64 {
        f64::from(self.sign())
    }

    /// Sign as a decimal, for money math.
    #[inline]
    pub fn sign_decimal(&self) -> Decimal {
        Decimal::from(self.sign())
    }

    /// Direction of a signed value; zero has no direction.
    pub fn from_sign(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Direction::Long)
        } else if value < 0.0 {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Get the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Broker-side order verb.
    pub fn as_order_side(&self) -> &'static str {
        match self {
            Direction::Long => "BUY",
            Direction::Short => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// An actionable entry produced by one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub direction: Direction,
    /// Gated confidence in [0, 1]
    pub confidence: f64,
    /// Price the levels were computed from
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Raw model probability of an up move
    pub probability: f64,
    /// Model price-delta estimate
    pub price_delta: f64,
}

/// Outcome of a signal evaluation. Levels only exist alongside a direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TradeDecision {
    #[default]
    NoTrade,
    Trade(TradeSignal),
}

impl TradeDecision {
    pub fn is_trade(&self) -> bool {
        matches!(self, TradeDecision::Trade(_))
    }

    pub fn signal(&self) -> Option<&TradeSignal> {
        match self {
            TradeDecision::Trade(signal) => Some(signal),
            TradeDecision::NoTrade => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.signal().map(|s| s.direction)
    }

    /// Confidence of the decision; zero when there is no trade.
    pub fn confidence(&self) -> f64 {
        self.signal().map(|s| s.confidence).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Long.sign(), 1);
        assert_eq!(Direction::Short.sign(), -1);
        assert_eq!(Direction::Short.sign_decimal(), dec!(-1));
        assert_eq!(Direction::Long.opposite(), Direction::Short);
    }

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(Direction::from_sign(0.3), Some(Direction::Long));
        assert_eq!(Direction::from_sign(-2.0), Some(Direction::Short));
        assert_eq!(Direction::from_sign(0.0), None);
    }

    #[test]
    fn test_no_trade_has_no_levels() {
        let decision = TradeDecision::default();
        assert!(!decision.is_trade());
        assert!(decision.signal().is_none());
        assert_eq!(decision.confidence(), 0.0);
    }

    #[test]
    fn test_trade_decision_accessors() {
        let decision = TradeDecision::Trade(TradeSignal {
            direction: Direction::Short,
            confidence: 0.6,
            entry_price: dec!(100),
            stop_loss: dec!(100.25),
            take_profit: dec!(99.25),
            probability: 0.3,
            price_delta: -0.5,
        });
        assert_eq!(decision.direction(), Some(Direction::Short));
        assert!((decision.confidence() - 0.6).abs() < 1e-12);
    }
}
