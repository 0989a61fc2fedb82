//! Exit rules for open positions.
//!
//! Two policies exist and behave differently:
//! - `Static` closes only when the take-profit or stop-loss level is crossed.
//! - `Dynamic` also looks at time in trade, a short EMA trend measure and
//!   recent return volatility. It may hold through a stop-loss touch while a
//!   recovery is underway, and may close a winner early when the trend fades
//!   in a volatile market. A hard maximum loss always applies.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::types::{ExitReason, Position, Timeframe};
use trading_indicators::{ema_series, returns_volatility};

const FAST_EMA: usize = 5;
const SLOW_EMA: usize = 13;
const VOLATILITY_RETURNS: usize = 10;

/// Which exit policy the position ledger applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicyKind {
    #[default]
    Static,
    Dynamic,
}

/// Per-timeframe thresholds for the dynamic policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitThresholds {
    pub min_hold: Duration,
    pub trend_threshold: f64,
    pub volatility_threshold: f64,
    /// Loss relative to position size that always closes the trade
    pub max_loss: f64,
}

impl ExitThresholds {
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let (min_hold, trend_threshold, volatility_threshold, max_loss) = match timeframe {
            Timeframe::Minute1 => (Duration::minutes(5), 0.0005, 0.002, 0.01),
            Timeframe::Minute5 => (Duration::minutes(15), 0.001, 0.004, 0.015),
            Timeframe::Hour1 => (Duration::hours(2), 0.002, 0.01, 0.02),
            Timeframe::Daily => (Duration::days(2), 0.005, 0.03, 0.05),
            Timeframe::Weekly => (Duration::days(14), 0.01, 0.06, 0.08),
        };
        Self {
            min_hold,
            trend_threshold,
            volatility_threshold,
            max_loss,
        }
    }
}

/// Market state the dynamic policy reads.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub now: DateTime<Utc>,
    /// Recent closes, oldest first
    pub recent_closes: &'a [f64],
}

impl<'a> MarketContext<'a> {
    pub fn new(now: DateTime<Utc>, recent_closes: &'a [f64]) -> Self {
        Self { now, recent_closes }
    }

    /// `(EMA5 - EMA13) / EMA13` at the latest close.
    pub fn trend_strength(&self) -> Option<f64> {
        if self.recent_closes.len() < SLOW_EMA {
            return None;
        }
        let fast = *ema_series(self.recent_closes, FAST_EMA).last()?;
        let slow = *ema_series(self.recent_closes, SLOW_EMA).last()?;
        if !fast.is_finite() || !slow.is_finite() || slow == 0.0 {
            return None;
        }
        Some((fast - slow) / slow)
    }

    /// Population standard deviation of the last ten returns.
    pub fn volatility(&self) -> Option<f64> {
        let n = self.recent_closes.len();
        if n < VOLATILITY_RETURNS + 1 {
            return None;
        }
        returns_volatility(&self.recent_closes[n - VOLATILITY_RETURNS - 1..], 1.0)
    }
}

/// Configured exit policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitPolicy {
    kind: ExitPolicyKind,
}

impl ExitPolicy {
    pub fn new(kind: ExitPolicyKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ExitPolicyKind {
        self.kind
    }

    /// Exit reason for `position` at `price`, or `None` to keep holding.
    ///
    /// `position` must already be marked at `price`.
    pub fn evaluate(
        &self,
        position: &Position,
        price: Decimal,
        ctx: &MarketContext<'_>,
    ) -> Option<ExitReason> {
        match self.kind {
            ExitPolicyKind::Static => static_exit(position, price),
            ExitPolicyKind::Dynamic => dynamic_exit(position, price, ctx),
        }
    }
}

fn static_exit(position: &Position, price: Decimal) -> Option<ExitReason> {
    if position.take_profit_hit(price) {
        Some(ExitReason::TakeProfit)
    } else if position.stop_loss_hit(price) {
        Some(ExitReason::StopLoss)
    } else {
        None
    }
}

fn dynamic_exit(position: &Position, price: Decimal, ctx: &MarketContext<'_>) -> Option<ExitReason> {
    if position.take_profit_hit(price) {
        return Some(ExitReason::TakeProfit);
    }

    let t = ExitThresholds::for_timeframe(position.timeframe);
    let ret = position.return_on_size().to_f64().unwrap_or(0.0);
    if ret <= -t.max_loss {
        return Some(ExitReason::StopLoss);
    }

    let trend = ctx.trend_strength().map(|v| v * position.direction.sign_f64());
    let volatility = ctx.volatility();

    if position.stop_loss_hit(price) {
        let recovering = matches!(
            (trend, volatility),
            (Some(tr), Some(vol)) if tr > t.trend_threshold && vol < t.volatility_threshold
        );
        return if recovering { None } else { Some(ExitReason::StopLoss) };
    }

    let held_long_enough = position.held_for(ctx.now) >= t.min_hold;
    let in_profit = position.current_pnl > Decimal::ZERO;
    if let (Some(tr), Some(vol)) = (trend, volatility) {
        if held_long_enough && in_profit && tr < t.trend_threshold && vol > t.volatility_threshold {
            return Some(ExitReason::EarlyExit);
        }
    }
    None
}
