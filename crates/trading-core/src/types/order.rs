//! Order submission and deal confirmation types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// Market order with optional attached protective levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Instrument identifier (epic)
    pub symbol: String,
    pub direction: Direction,
    /// Position size in instrument units
    pub size: Decimal,
    /// Stop-loss level attached to the deal
    pub stop_level: Option<Decimal>,
    /// Take-profit level attached to the deal
    pub profit_level: Option<Decimal>,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(symbol: impl Into<String>, direction: Direction, size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            size,
            stop_level: None,
            profit_level: None,
        }
    }

    /// Attach a stop-loss level.
    pub fn with_stop(mut self, level: Decimal) -> Self {
        self.stop_level = Some(level);
        self
    }

    /// Attach a take-profit level.
    pub fn with_profit(mut self, level: Decimal) -> Self {
        self.profit_level = Some(level);
        self
    }

    /// Reject malformed requests before they reach a broker.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        if self.size <= Decimal::ZERO {
            return Err(format!("size must be positive, got {}", self.size));
        }
        if let (Some(stop), Some(profit)) = (self.stop_level, self.profit_level) {
            let ordered = match self.direction {
                Direction::Long => stop < profit,
                Direction::Short => profit < stop,
            };
            if !ordered {
                return Err(format!(
                    "levels out of order for {}: stop {} profit {}",
                    self.direction, stop, profit
                ));
            }
        }
        Ok(())
    }
}

/// Broker handle for a submitted order, used to poll for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealReference(pub String);

impl std::fmt::Display for DealReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported when polling a deal reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// Position is open at the broker
    Open,
    /// Broker has not decided yet
    Pending,
    Rejected,
    Deleted,
}

impl DealStatus {
    /// Whether polling can stop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DealStatus::Pending)
    }
}

/// Confirmation payload for a deal reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealConfirmation {
    pub reference: DealReference,
    pub status: DealStatus,
    /// Broker deal id once open
    pub deal_id: Option<String>,
    /// Fill level once open
    pub level: Option<Decimal>,
    /// Rejection reason, if any
    pub reason: Option<String>,
}

/// Execution details of an accepted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Broker deal id
    pub deal_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub size: Decimal,
    /// Executed price
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}
