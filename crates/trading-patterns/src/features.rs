//! Per-bar pattern features.

use serde::{Deserialize, Serialize};
use trading_core::Bar;

use crate::fractals::{detect_fractals, FractalRule, Fractals, FRACTAL_WINDOW};
use crate::harmonic::pattern_signal;

/// Series derived from fractals and harmonics, aligned with the input bars.
#[derive(Debug, Clone, Default)]
pub struct PatternFeatures {
    pub fractals: Fractals,
    /// Bars since the last top fractal, -1 if none seen yet
    pub distance_to_top: Vec<i64>,
    /// Bars since the last bottom fractal, -1 if none seen yet
    pub distance_to_bottom: Vec<i64>,
    /// Σ direction × weight of harmonic matches ending at each bar
    pub pattern_signal: Vec<f64>,
}

/// Pattern state at the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestPattern {
    pub distance_to_top: i64,
    pub distance_to_bottom: i64,
    pub pattern_signal: f64,
    pub top_fractal: bool,
    pub bottom_fractal: bool,
}

impl LatestPattern {
    /// The three model inputs, in order.
    pub fn as_features(&self) -> [f64; 3] {
        [
            self.distance_to_top as f64,
            self.distance_to_bottom as f64,
            self.pattern_signal,
        ]
    }
}

/// Fractal and harmonic detector configured with a fractal rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector {
    rule: FractalRule,
}

impl PatternDetector {
    pub fn new(rule: FractalRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> FractalRule {
        self.rule
    }

    /// Minimum bars for any pattern to be defined.
    pub fn min_bars(&self) -> usize {
        FRACTAL_WINDOW
    }

    /// Full feature series for `bars`.
    pub fn analyze(&self, bars: &[Bar]) -> PatternFeatures {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fractals = detect_fractals(&high, &low, self.rule);

        let n = bars.len();
        let mut distance_to_top = Vec::with_capacity(n);
        let mut distance_to_bottom = Vec::with_capacity(n);
        let mut signals = Vec::with_capacity(n);
        let mut last_top: Option<usize> = None;
        let mut last_bottom: Option<usize> = None;

        for i in 0..n {
            if fractals.tops[i] {
                last_top = Some(i);
            }
            if fractals.bottoms[i] {
                last_bottom = Some(i);
            }
            distance_to_top.push(last_top.map_or(-1, |t| (i - t) as i64));
            distance_to_bottom.push(last_bottom.map_or(-1, |b| (i - b) as i64));
            signals.push(pattern_signal(&close, i));
        }

        PatternFeatures {
            fractals,
            distance_to_top,
            distance_to_bottom,
            pattern_signal: signals,
        }
    }

    /// Pattern state at the last bar; `None` for fewer than five bars.
    pub fn latest(&self, bars: &[Bar]) -> Option<LatestPattern> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let features = self.analyze(bars);
        let i = bars.len() - 1;
        Some(LatestPattern {
            distance_to_top: features.distance_to_top[i],
            distance_to_bottom: features.distance_to_bottom[i],
            pattern_signal: features.pattern_signal[i],
            top_fractal: features.fractals.tops[i],
            bottom_fractal: features.fractals.bottoms[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
        highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&h, &l))| Bar::new(i as i64, l, h, l, (h + l) / 2.0, 1.0))
            .collect()
    }

    #[test]
    fn test_distances() {
        let highs = [1.0, 2.0, 3.0, 2.0, 1.0, 1.5, 1.2, 1.1];
        let lows = [0.5; 8];
        let features = PatternDetector::default().analyze(&bars_from(&highs, &lows));

        assert_eq!(features.distance_to_top, vec![-1, -1, -1, -1, 0, 1, 2, 3]);
        assert!(features.distance_to_bottom.iter().all(|d| *d == -1));
    }

    #[test]
    fn test_latest_requires_five_bars() {
        let detector = PatternDetector::new(FractalRule::BillWilliams);
        let bars = bars_from(&[1.0, 2.0, 3.0, 2.0], &[0.5; 4]);
        assert!(detector.latest(&bars).is_none());
    }

    #[test]
    fn test_latest_snapshot() {
        let highs = [1.0, 2.0, 3.0, 2.0, 1.0];
        let lows = [0.5, 0.4, 0.3, 0.4, 0.5];
        let latest = PatternDetector::default()
            .latest(&bars_from(&highs, &lows))
            .unwrap();

        assert!(latest.top_fractal);
        assert!(latest.bottom_fractal);
        assert_eq!(latest.as_features()[0], 0.0);
        assert_eq!(latest.as_features()[1], 0.0);
    }
}
