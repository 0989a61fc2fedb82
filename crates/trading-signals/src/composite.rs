//! Diagnostic blend of model, fractal and technical sub-signals.
//!
//! Each sub-signal lies in [0, 1] with 0.5 as neutral. The blend is logged
//! alongside every decision; it does not gate trades.

use serde::{Deserialize, Serialize};
use trading_indicators::NEUTRAL;
use trading_patterns::LatestPattern;

use crate::technical::TechnicalSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub use_model: bool,
    pub use_fractal: bool,
    pub use_technical: bool,
    pub model_weight: f64,
    pub fractal_weight: f64,
    pub technical_weight: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            use_model: true,
            use_fractal: true,
            use_technical: true,
            model_weight: 0.4,
            fractal_weight: 0.3,
            technical_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub model: f64,
    pub fractal: f64,
    pub technical: f64,
    pub combined: f64,
}

/// `0.5 ± 0.25` for a bottom/top fractal on the latest bar, plus a quarter of
/// the pattern signal.
pub fn fractal_sub_signal(pattern: &LatestPattern) -> f64 {
    let mut signal = NEUTRAL;
    if pattern.bottom_fractal {
        signal += 0.25;
    } else if pattern.top_fractal {
        signal -= 0.25;
    }
    (signal + pattern.pattern_signal * 0.25).clamp(0.0, 1.0)
}

/// `0.5 + score / 4`.
pub fn technical_sub_signal(summary: &TechnicalSummary) -> f64 {
    (NEUTRAL + f64::from(summary.tech_signal) / 4.0).clamp(0.0, 1.0)
}

impl CompositeSignal {
    pub fn compute(
        weights: &CompositeWeights,
        probability: Option<f64>,
        pattern: Option<&LatestPattern>,
        technical: Option<&TechnicalSummary>,
    ) -> Self {
        let model = probability
            .filter(|_| weights.use_model)
            .filter(|p| p.is_finite())
            .map_or(NEUTRAL, |p| p.clamp(0.0, 1.0));
        let fractal = pattern
            .filter(|_| weights.use_fractal)
            .map_or(NEUTRAL, fractal_sub_signal);
        let technical = technical
            .filter(|_| weights.use_technical)
            .map_or(NEUTRAL, technical_sub_signal);

        let total = weights.model_weight + weights.fractal_weight + weights.technical_weight;
        let combined = if total > 0.0 {
            (model * weights.model_weight
                + fractal * weights.fractal_weight
                + technical * weights.technical_weight)
                / total
        } else {
            NEUTRAL
        };

        Self {
            model,
            fractal,
            technical,
            combined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(top: bool, bottom: bool, signal: f64) -> LatestPattern {
        LatestPattern {
            distance_to_top: 0,
            distance_to_bottom: 0,
            pattern_signal: signal,
            top_fractal: top,
            bottom_fractal: bottom,
        }
    }

    fn summary(score: i8) -> TechnicalSummary {
        TechnicalSummary {
            bb_position: 0.5,
            bb_width: 0.0,
            rsi: 0.5,
            tech_signal: score,
            predicted_move: 0.0,
        }
    }

    #[test]
    fn test_fractal_sub_signal() {
        assert_eq!(fractal_sub_signal(&pattern(false, false, 0.0)), 0.5);
        assert_eq!(fractal_sub_signal(&pattern(false, true, 0.0)), 0.75);
        assert_eq!(fractal_sub_signal(&pattern(true, false, 0.0)), 0.25);
        // Bottom takes precedence when both are flagged
        assert_eq!(fractal_sub_signal(&pattern(true, true, 0.0)), 0.75);
        assert_eq!(fractal_sub_signal(&pattern(false, true, 1.5)), 1.0);
    }

    #[test]
    fn test_technical_sub_signal() {
        assert_eq!(technical_sub_signal(&summary(2)), 1.0);
        assert_eq!(technical_sub_signal(&summary(-1)), 0.25);
    }

    #[test]
    fn test_unavailable_parts_are_neutral() {
        let c = CompositeSignal::compute(&CompositeWeights::default(), None, None, None);
        assert_eq!(c.combined, 0.5);
    }

    #[test]
    fn test_weighted_blend() {
        let weights = CompositeWeights::default();
        let c = CompositeSignal::compute(&weights, Some(1.0), Some(&pattern(false, false, 0.0)), Some(&summary(-2)));
        // 0.4 * 1.0 + 0.3 * 0.5 + 0.3 * 0.0
        assert!((c.combined - 0.55).abs() < 1e-12);

        let disabled = CompositeWeights {
            use_model: false,
            ..Default::default()
        };
        let c = CompositeSignal::compute(&disabled, Some(1.0), None, None);
        assert_eq!(c.model, 0.5);
    }
}
