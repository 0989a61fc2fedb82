//! Position lifecycle types.
//!
//! An open [`Position`] carries no exit attributes. Closing consumes it and
//! produces a [`ClosedPosition`], so exit data cannot exist on an open trade
//! and a closed trade cannot be re-opened.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{Direction, Fill, Timeframe};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    /// Dynamic policy closed the trade before either level was hit
    EarlyExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "TP"),
            ExitReason::StopLoss => write!(f, "SL"),
            ExitReason::EarlyExit => write!(f, "EARLY"),
        }
    }
}

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Local identifier
    pub id: Uuid,
    /// Persistence id; `None` when the creation record could not be stored
    pub trade_id: Option<i64>,
    /// Broker deal id
    pub deal_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub entry_time: DateTime<Utc>,
    pub timeframe: Timeframe,
    /// Unrealized P&L at the last marked price
    pub current_pnl: Decimal,
    /// Last price the position was marked at
    pub hit_price: Option<Decimal>,
}

impl Position {
    /// Open a position from an executed fill.
    pub fn open(fill: Fill, stop_loss: Decimal, take_profit: Decimal, timeframe: Timeframe) -> Self {
        Self {
            id: Uuid::new_v4(),
            trade_id: None,
            deal_id: fill.deal_id,
            symbol: fill.symbol,
            direction: fill.direction,
            entry_price: fill.price,
            size: fill.size,
            stop_loss,
            take_profit,
            entry_time: fill.timestamp,
            timeframe,
            current_pnl: Decimal::ZERO,
            hit_price: None,
        }
    }

    /// P&L at `price`: `direction * size * (price - entry) / entry`.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        self.direction.sign_decimal() * self.size * (price - self.entry_price) / self.entry_price
    }

    /// Mark the position to `price`, returning the new unrealized P&L.
    pub fn mark(&mut self, price: Decimal) -> Decimal {
        self.current_pnl = self.pnl_at(price);
        self.hit_price = Some(price);
        self.current_pnl
    }

    /// P&L relative to position size.
    pub fn return_on_size(&self) -> Decimal {
        if self.size.is_zero() {
            return Decimal::ZERO;
        }
        self.current_pnl / self.size
    }

    /// Whether the take-profit level has been reached at `price`.
    pub fn take_profit_hit(&self, price: Decimal) -> bool {
        match self.direction {
            Direction::Long => price >= self.take_profit,
            Direction::Short => price <= self.take_profit,
        }
    }

    /// Whether the stop-loss level has been reached at `price`.
    pub fn stop_loss_hit(&self, price: Decimal) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }

    /// Time in trade as of `now`.
    pub fn held_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.entry_time
    }

    /// Close the position at `exit_price`.
    pub fn close(self, exit_price: Decimal, exit_time: DateTime<Utc>, outcome: ExitReason) -> ClosedPosition {
        let realized_pnl = self.pnl_at(exit_price);
        ClosedPosition {
            position: self,
            exit_price,
            exit_time,
            outcome,
            realized_pnl,
        }
    }
}

/// A position that has left the open set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub position: Position,
    pub exit_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub outcome: ExitReason,
    pub realized_pnl: Decimal,
}

impl ClosedPosition {
    pub fn is_win(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.realized_pnl < Decimal::ZERO
    }
}

/// Immutable ledger entry: a closed position plus the balance after booking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub closed: ClosedPosition,
    pub balance_after: Decimal,
}

impl ClosedTrade {
    pub fn position(&self) -> &Position {
        &self.closed.position
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.closed.realized_pnl
    }

    pub fn outcome(&self) -> ExitReason {
        self.closed.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill(direction: Direction, price: Decimal) -> Fill {
        Fill {
            deal_id: "D1".to_string(),
            symbol: "BTCUSD".to_string(),
            direction,
            size: dec!(0.5),
            price,
            timestamp: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_long_pnl() {
        let mut position = Position::open(fill(Direction::Long, dec!(100)), dec!(97), dec!(103), Timeframe::Minute1);
        assert_eq!(position.mark(dec!(110)), dec!(0.05));
        assert_eq!(position.hit_price, Some(dec!(110)));
        assert_eq!(position.pnl_at(dec!(90)), dec!(-0.05));
    }

    #[test]
    fn test_short_pnl() {
        let position = Position::open(fill(Direction::Short, dec!(100)), dec!(103), dec!(97), Timeframe::Minute1);
        assert_eq!(position.pnl_at(dec!(90)), dec!(0.05));
        assert_eq!(position.pnl_at(dec!(110)), dec!(-0.05));
    }

    #[test]
    fn test_level_hits() {
        let long = Position::open(fill(Direction::Long, dec!(100)), dec!(97), dec!(103), Timeframe::Minute1);
        assert!(long.take_profit_hit(dec!(103)));
        assert!(long.stop_loss_hit(dec!(96.5)));
        assert!(!long.take_profit_hit(dec!(102.9)));

        let short = Position::open(fill(Direction::Short, dec!(100)), dec!(103), dec!(97), Timeframe::Minute1);
        assert!(short.take_profit_hit(dec!(96)));
        assert!(short.stop_loss_hit(dec!(103)));
    }

    #[test]
    fn test_close_realizes_pnl() {
        let position = Position::open(fill(Direction::Long, dec!(100)), dec!(97), dec!(103), Timeframe::Minute1);
        let closed = position.close(dec!(103.5), DateTime::UNIX_EPOCH, ExitReason::TakeProfit);
        assert_eq!(closed.realized_pnl, dec!(0.5) * dec!(3.5) / dec!(100));
        assert!(closed.is_win());
    }
}
