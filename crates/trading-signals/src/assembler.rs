//! Model input vector assembly.
//!
//! Layout: one value per configured indicator feature, then
//! `[distance_to_top, distance_to_bottom, pattern_signal]`, then
//! `[bb_position, bb_width, rsi, tech_signal]`.

use trading_core::error::SignalError;
use trading_core::types::{closes, Bar};
use trading_indicators::{latest_feature, FeatureSpec};
use trading_patterns::{FractalRule, LatestPattern, PatternDetector};

use crate::technical::{TechnicalAnalyzer, TechnicalConfig, TechnicalSummary};

pub const PATTERN_FEATURES: usize = 3;
pub const TECHNICAL_FEATURES: usize = 4;

/// One assembled input plus the component results it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeatures {
    pub vector: Vec<f64>,
    pub pattern: LatestPattern,
    pub technical: TechnicalSummary,
}

#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    specs: Vec<FeatureSpec>,
    patterns: PatternDetector,
    technical: TechnicalAnalyzer,
}

impl FeatureAssembler {
    pub fn new(
        specs: Vec<FeatureSpec>,
        rule: FractalRule,
        technical: &TechnicalConfig,
    ) -> Result<Self, SignalError> {
        if specs.is_empty() {
            return Err(SignalError::InvalidConfig("at least one indicator feature is required".into()));
        }
        for spec in &specs {
            spec.validate().map_err(SignalError::InvalidConfig)?;
        }
        Ok(Self {
            specs,
            patterns: PatternDetector::new(rule),
            technical: TechnicalAnalyzer::new(technical)?,
        })
    }

    pub fn specs(&self) -> &[FeatureSpec] {
        &self.specs
    }

    pub fn indicator_count(&self) -> usize {
        self.specs.len()
    }

    /// Length of every assembled vector.
    pub fn feature_len(&self) -> usize {
        self.specs.len() + PATTERN_FEATURES + TECHNICAL_FEATURES
    }

    /// Bars needed before every component is available.
    pub fn min_bars(&self) -> usize {
        self.specs
            .iter()
            .map(FeatureSpec::warmup)
            .chain([self.patterns.min_bars(), self.technical.min_bars()])
            .max()
            .unwrap_or(0)
    }

    /// Features at the last bar of `window`.
    ///
    /// `None` if any component is unavailable; a partial vector is never built.
    pub fn assemble(&self, window: &[Bar]) -> Option<AssembledFeatures> {
        if window.len() < self.min_bars() {
            return None;
        }

        let mut vector = Vec::with_capacity(self.feature_len());
        for spec in &self.specs {
            vector.push(latest_feature(spec, window)?);
        }

        let pattern = self.patterns.latest(window)?;
        vector.extend(pattern.as_features());

        let technical = self.technical.latest(&closes(window))?;
        vector.extend(technical.as_features());

        if vector.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(AssembledFeatures {
            vector,
            pattern,
            technical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.3).sin() * 3.0 + i as f64 * 0.02;
                Bar::new(i as i64 * 60_000, c, c + 0.6, c - 0.6, c, 1_000.0)
            })
            .collect()
    }

    fn assembler() -> FeatureAssembler {
        FeatureAssembler::new(FeatureSpec::defaults(), FractalRule::BillWilliams, &TechnicalConfig::default())
            .unwrap()
    }

    #[test]
    fn test_default_shape() {
        let a = assembler();
        assert_eq!(a.feature_len(), 11);
        // ADX(20) needs the longest warm-up
        assert_eq!(a.min_bars(), 40);
    }

    #[test]
    fn test_assemble_layout_and_ranges() {
        let a = assembler();
        let features = a.assemble(&wavy(120)).unwrap();
        let v = &features.vector;

        assert_eq!(v.len(), 11);
        assert!(v[..4].iter().all(|x| (0.0..=1.0).contains(x)));
        assert!(v[4] >= -1.0 && v[4].fract() == 0.0);
        assert!(v[5] >= -1.0 && v[5].fract() == 0.0);
        assert_eq!(v[6], features.pattern.pattern_signal);
        assert_eq!(&v[7..], &features.technical.as_features());
        assert!((0.0..=1.0).contains(&v[9]));
    }

    #[test]
    fn test_short_window_is_unavailable() {
        let a = assembler();
        assert!(a.assemble(&wavy(39)).is_none());
        assert!(a.assemble(&wavy(40)).is_some());
    }

    #[test]
    fn test_rejects_empty_feature_set() {
        assert!(FeatureAssembler::new(vec![], FractalRule::Regular, &TechnicalConfig::default()).is_err());
    }
}
