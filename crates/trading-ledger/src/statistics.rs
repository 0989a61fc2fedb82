//! Session statistics.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::types::{ClosedPosition, Direction, ExitReason};

/// Maximum peak-to-trough drawdown of an equity curve, in percent.
///
/// Walks the curve keeping the running peak; a non-positive peak contributes
/// no drawdown.
pub fn compute_drawdown(equity: &[Decimal]) -> Decimal {
    let mut peak = Decimal::MIN;
    let mut max_drawdown = Decimal::ZERO;
    for &balance in equity {
        if balance > peak {
            peak = balance;
        }
        if peak > Decimal::ZERO {
            let drawdown = (peak - balance) / peak * dec!(100);
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }
    max_drawdown
}

/// Running totals for one trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Balance at session start
    pub initial_balance: Decimal,
    /// Balance after the last booked trade
    pub balance: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub take_profit_exits: usize,
    pub stop_loss_exits: usize,
    pub early_exits: usize,
    /// Sum of winning P&L
    pub gross_profit: Decimal,
    /// Sum of losing P&L, as a positive amount
    pub gross_loss: Decimal,
    pub largest_win: Decimal,
    /// Largest single loss, as a positive amount
    pub largest_loss: Decimal,
    /// Balance after each booked trade, starting with the initial balance
    pub equity_curve: Vec<Decimal>,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    peak_balance: Decimal,
}

impl SessionStats {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            long_trades: 0,
            short_trades: 0,
            take_profit_exits: 0,
            stop_loss_exits: 0,
            early_exits: 0,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            equity_curve: vec![initial_balance],
            max_drawdown_pct: Decimal::ZERO,
            peak_balance: initial_balance,
        }
    }

    /// Book a closed position, returning the balance after it.
    pub fn record(&mut self, closed: &ClosedPosition) -> Decimal {
        let pnl = closed.realized_pnl;
        self.balance += pnl;
        self.total_trades += 1;

        match closed.position.direction {
            Direction::Long => self.long_trades += 1,
            Direction::Short => self.short_trades += 1,
        }
        match closed.outcome {
            ExitReason::TakeProfit => self.take_profit_exits += 1,
            ExitReason::StopLoss => self.stop_loss_exits += 1,
            ExitReason::EarlyExit => self.early_exits += 1,
        }

        if closed.is_win() {
            self.winning_trades += 1;
            self.gross_profit += pnl;
            self.largest_win = self.largest_win.max(pnl);
        } else if closed.is_loss() {
            self.losing_trades += 1;
            self.gross_loss -= pnl;
            self.largest_loss = self.largest_loss.max(-pnl);
        }

        self.equity_curve.push(self.balance);

        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }
        if self.peak_balance > Decimal::ZERO {
            let drawdown = (self.peak_balance - self.balance) / self.peak_balance * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.balance
    }

    /// Net realized P&L.
    pub fn total_pnl(&self) -> Decimal {
        self.balance - self.initial_balance
    }

    pub fn win_rate_pct(&self) -> Decimal {
        if self.total_trades == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.winning_trades) / Decimal::from(self.total_trades) * dec!(100)
    }

    /// Gross profit over gross loss; `None` while no trade has lost.
    pub fn profit_factor(&self) -> Option<Decimal> {
        if self.gross_loss.is_zero() {
            None
        } else {
            Some(self.gross_profit / self.gross_loss)
        }
    }

    pub fn avg_win(&self) -> Decimal {
        if self.winning_trades == 0 {
            Decimal::ZERO
        } else {
            self.gross_profit / Decimal::from(self.winning_trades)
        }
    }

    pub fn avg_loss(&self) -> Decimal {
        if self.losing_trades == 0 {
            Decimal::ZERO
        } else {
            self.gross_loss / Decimal::from(self.losing_trades)
        }
    }

    pub fn return_pct(&self) -> Decimal {
        if self.initial_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.total_pnl() / self.initial_balance * dec!(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use trading_core::types::{Fill, Position, Timeframe};

    fn closed(direction: Direction, pnl: Decimal, outcome: ExitReason) -> ClosedPosition {
        let fill = Fill {
            deal_id: "D".into(),
            symbol: "EURUSD".into(),
            direction,
            size: dec!(1),
            price: dec!(100),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
        };
        let position = Position::open(fill, dec!(97), dec!(103), Timeframe::Minute1);
        let mut closed = position.close(dec!(100), DateTime::<Utc>::UNIX_EPOCH, outcome);
        closed.realized_pnl = pnl;
        closed
    }

    #[test]
    fn test_drawdown_after_win_then_loss() {
        let mut stats = SessionStats::new(dec!(1000));
        stats.record(&closed(Direction::Long, dec!(50), ExitReason::TakeProfit));
        let balance = stats.record(&closed(Direction::Short, dec!(-20), ExitReason::StopLoss));

        assert_eq!(balance, dec!(1030));
        assert_eq!(stats.equity_curve, vec![dec!(1000), dec!(1050), dec!(1030)]);

        let expected = dec!(20) / dec!(1050) * dec!(100);
        assert_eq!(stats.max_drawdown_pct, expected);
        assert_eq!(compute_drawdown(&stats.equity_curve), expected);
        assert!((stats.max_drawdown_pct - dec!(1.9048)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_counters_and_derived() {
        let mut stats = SessionStats::new(dec!(1000));
        stats.record(&closed(Direction::Long, dec!(30), ExitReason::TakeProfit));
        stats.record(&closed(Direction::Long, dec!(10), ExitReason::EarlyExit));
        stats.record(&closed(Direction::Short, dec!(-20), ExitReason::StopLoss));
        stats.record(&closed(Direction::Short, Decimal::ZERO, ExitReason::StopLoss));

        assert_eq!(stats.total_trades, 4);
        assert_eq!((stats.winning_trades, stats.losing_trades), (2, 1));
        assert_eq!((stats.long_trades, stats.short_trades), (2, 2));
        assert_eq!(
            (stats.take_profit_exits, stats.stop_loss_exits, stats.early_exits),
            (1, 2, 1)
        );
        assert_eq!(stats.largest_win, dec!(30));
        assert_eq!(stats.largest_loss, dec!(20));
        assert_eq!(stats.win_rate_pct(), dec!(50));
        assert_eq!(stats.profit_factor(), Some(dec!(2)));
        assert_eq!(stats.avg_win(), dec!(20));
        assert_eq!(stats.avg_loss(), dec!(20));
        assert_eq!(stats.return_pct(), dec!(2));
    }

    #[test]
    fn test_empty_session() {
        let stats = SessionStats::new(dec!(500));
        assert_eq!(stats.win_rate_pct(), Decimal::ZERO);
        assert_eq!(stats.profit_factor(), None);
        assert_eq!(stats.max_drawdown_pct, Decimal::ZERO);
        assert_eq!(compute_drawdown(&[]), Decimal::ZERO);
    }
}
