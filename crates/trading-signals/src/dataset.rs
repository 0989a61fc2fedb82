//! Training samples from historical bars.

use trading_core::types::Bar;
use trading_model::TrainingSample;

use crate::assembler::FeatureAssembler;

/// One sample per bar with a full feature window behind it and `horizon`
/// bars ahead of it.
///
/// Features are assembled over the `window` bars ending at `i`, the same way
/// live evaluation slices them. The label is 1 when `close[i + horizon]`
/// exceeds `close[i]`, and the price target is their difference.
pub fn build_training_set(
    assembler: &FeatureAssembler,
    bars: &[Bar],
    window: usize,
    horizon: usize,
) -> Vec<TrainingSample> {
    let window = window.max(assembler.min_bars());
    if horizon == 0 || bars.len() < window + horizon {
        return Vec::new();
    }

    (window - 1..bars.len() - horizon)
        .filter_map(|i| {
            let slice = &bars[i + 1 - window..=i];
            let features = assembler.assemble(slice)?;
            let now = bars[i].close;
            let future = bars[i + horizon].close;
            Some(TrainingSample {
                features: features.vector,
                label: if future > now { 1.0 } else { 0.0 },
                price_delta: future - now,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_indicators::FeatureSpec;
    use trading_patterns::FractalRule;

    use crate::technical::TechnicalConfig;

    fn wavy(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.2).sin() * 5.0;
                Bar::new(i as i64 * 60_000, c, c + 0.4, c - 0.4, c, 500.0)
            })
            .collect()
    }

    fn assembler() -> FeatureAssembler {
        FeatureAssembler::new(FeatureSpec::defaults(), FractalRule::Regular, &TechnicalConfig::default()).unwrap()
    }

    #[test]
    fn test_sample_count_and_labels() {
        let bars = wavy(120);
        let samples = build_training_set(&assembler(), &bars, 60, 5);

        // Indices 59..115
        assert_eq!(samples.len(), 56);
        let first = &samples[0];
        assert_eq!(first.features.len(), 11);
        let expected = bars[64].close - bars[59].close;
        assert!((first.price_delta - expected).abs() < 1e-12);
        assert_eq!(first.label, if expected > 0.0 { 1.0 } else { 0.0 });
    }

    #[test]
    fn test_too_few_bars() {
        assert!(build_training_set(&assembler(), &wavy(44), 40, 5).is_empty());
        assert!(build_training_set(&assembler(), &wavy(100), 40, 0).is_empty());
    }
}
