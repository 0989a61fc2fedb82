//! Timeframe-dependent evaluation parameters.

use serde::{Deserialize, Serialize};
use trading_core::types::Timeframe;

/// Window and threshold set for one timeframe in adaptive mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeProfile {
    /// Bars used for volatility, ADX and momentum
    pub window: usize,
    pub adx_period: usize,
    pub momentum_period: usize,
    /// ADX level at which the trend factor reaches 1.0
    pub trend_threshold: f64,
    /// Annualized volatility above which confidence is cut
    pub volatility_high: f64,
    /// Annualized volatility below which confidence is boosted
    pub volatility_low: f64,
    /// `sqrt(periods per year)`
    pub annualization: f64,
}

impl TimeframeProfile {
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let (window, adx_period, momentum_period, trend_threshold, volatility_high, volatility_low) =
            match timeframe {
                Timeframe::Minute1 => (60, 14, 10, 25.0, 1.0, 0.3),
                Timeframe::Minute5 => (24, 10, 6, 20.0, 0.9, 0.25),
                Timeframe::Hour1 => (48, 14, 12, 25.0, 0.8, 0.2),
                Timeframe::Daily => (60, 14, 10, 25.0, 0.7, 0.15),
                Timeframe::Weekly => (52, 14, 8, 25.0, 0.6, 0.1),
            };
        Self {
            window,
            adx_period,
            momentum_period,
            trend_threshold,
            volatility_high,
            volatility_low,
            annualization: timeframe.periods_per_year().sqrt(),
        }
    }

    /// Multiplier from annualized volatility: 0.7 when high, 1.2 when low.
    pub fn volatility_factor(&self, volatility: Option<f64>) -> f64 {
        match volatility {
            Some(v) if v > self.volatility_high => 0.7,
            Some(v) if v < self.volatility_low => 1.2,
            _ => 1.0,
        }
    }

    /// `min(adx / trend_threshold, 1.2)`; 1.0 when ADX is unavailable.
    pub fn trend_factor(&self, adx: Option<f64>) -> f64 {
        adx.map_or(1.0, |adx| (adx / self.trend_threshold).min(1.2))
    }

    /// 1.1 when momentum agrees with the model's direction, else 0.9.
    pub fn momentum_factor(momentum: Option<f64>, model_direction: f64) -> f64 {
        match momentum {
            Some(m) if m != 0.0 && model_direction != 0.0 && m.signum() == model_direction.signum() => 1.1,
            _ => 0.9,
        }
    }
}
