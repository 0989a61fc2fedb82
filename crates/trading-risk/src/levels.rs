//! Stop-loss and take-profit levels for a new entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::types::Direction;

/// Exit levels attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Fixed-percentage levels around `price`.
///
/// Long: stop below, target above. Short: mirrored. For positive `price` and
/// percentages in (0, 1) the price always lies strictly between the levels.
pub fn get_trade_levels(
    price: Decimal,
    direction: Direction,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
) -> TradeLevels {
    let stop_offset = price * stop_loss_pct;
    let profit_offset = price * take_profit_pct;
    match direction {
        Direction::Long => TradeLevels {
            stop_loss: price - stop_offset,
            take_profit: price + profit_offset,
        },
        Direction::Short => TradeLevels {
            stop_loss: price + stop_offset,
            take_profit: price - profit_offset,
        },
    }
}

/// Convert an indicator-side price to money precision.
pub fn price_to_decimal(price: f64) -> Option<Decimal> {
    if !price.is_finite() {
        return None;
    }
    Decimal::from_f64_retain(price).map(|d| d.round_dp(8).normalize())
}
