//! Gating filters applied to a candidate direction.
//!
//! A filter that cannot be evaluated (too little data) lets the candidate
//! through.

use serde::{Deserialize, Serialize};
use trading_core::types::Direction;
use trading_indicators::regression_slope;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Rejection {
    LowConfidence { confidence: f64, threshold: f64 },
    NoDirection { probability: f64 },
    WeakTrend { adx: f64, threshold: f64 },
    CounterRegime { slope: f64, threshold: f64 },
}

/// Reject when the trend is weaker than `threshold` (ADX, 0..100).
#[derive(Debug, Clone, Copy)]
pub struct AdxFilter {
    pub threshold: f64,
}

impl AdxFilter {
    pub fn check(&self, adx: Option<f64>) -> Result<(), Rejection> {
        match adx {
            Some(adx) if adx < self.threshold => Err(Rejection::WeakTrend {
                adx,
                threshold: self.threshold,
            }),
            _ => Ok(()),
        }
    }
}

/// Reject trades against the regression slope of recent closes.
#[derive(Debug, Clone, Copy)]
pub struct RegimeFilter {
    /// Bars of slope history; the fit uses `lookback + 1` closes
    pub lookback: usize,
    pub threshold: f64,
}

impl RegimeFilter {
    /// Slope over the last `lookback + 1` closes; `None` if fewer are available.
    pub fn slope(&self, closes: &[f64]) -> Option<f64> {
        let n = closes.len();
        if n < self.lookback + 1 {
            return None;
        }
        regression_slope(&closes[n - self.lookback - 1..])
    }

    /// Longs need `slope >= -threshold`, shorts need `slope <= threshold`.
    pub fn check(&self, closes: &[f64], direction: Direction) -> Result<(), Rejection> {
        let Some(slope) = self.slope(closes) else {
            return Ok(());
        };
        let rejected = match direction {
            Direction::Long => slope < -self.threshold,
            Direction::Short => slope > self.threshold,
        };
        if rejected {
            Err(Rejection::CounterRegime {
                slope,
                threshold: self.threshold,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adx_filter() {
        let filter = AdxFilter { threshold: 15.0 };
        assert!(filter.check(Some(20.0)).is_ok());
        assert!(filter.check(None).is_ok());
        assert!(matches!(filter.check(Some(10.0)), Err(Rejection::WeakTrend { .. })));
    }

    #[test]
    fn test_regime_filter() {
        let filter = RegimeFilter {
            lookback: 20,
            threshold: 0.05,
        };
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();

        assert!(filter.check(&rising, Direction::Long).is_ok());
        assert!(filter.check(&rising, Direction::Short).is_err());
        assert!(filter.check(&falling, Direction::Long).is_err());
        assert!(filter.check(&falling, Direction::Short).is_ok());
    }

    #[test]
    fn test_regime_filter_needs_history() {
        let filter = RegimeFilter {
            lookback: 20,
            threshold: 0.05,
        };
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(filter.slope(&rising).is_none());
        assert!(filter.check(&rising, Direction::Short).is_ok());
        assert!(filter.slope(&[]).is_none());
    }

    #[test]
    fn test_flat_market_passes_both_ways() {
        let filter = RegimeFilter {
            lookback: 20,
            threshold: 0.05,
        };
        let flat = [100.0; 25];
        assert!(filter.check(&flat, Direction::Long).is_ok());
        assert!(filter.check(&flat, Direction::Short).is_ok());
    }
}
