//! Volatility indicators.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use trading_core::traits::MultiOutputIndicator;

use crate::simd::sum_simd;

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
    /// Band width relative to the middle band
    pub bandwidth: f64,
    /// Position of the price inside the bands, 0.5 when the bands collapse
    pub percent_b: f64,
}

/// Bollinger Bands: SMA middle band with population standard deviation bands.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Bands for the most recent bar only.
    pub fn latest(&self, data: &[f64]) -> Option<BollingerOutput> {
        let start = data.len().checked_sub(self.period)?;
        Some(self.bands(&data[start..]))
    }

    fn bands(&self, window: &[f64]) -> BollingerOutput {
        let n = window.len() as f64;
        let mean = sum_simd(window) / n;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let offset = self.std_dev_multiplier * variance.sqrt();
        let (upper, lower) = (mean + offset, mean - offset);
        let price = window[window.len() - 1];

        BollingerOutput {
            upper,
            middle: mean,
            lower,
            bandwidth: if mean != 0.0 { (upper - lower) / mean } else { 0.0 },
            percent_b: if upper != lower {
                (price - lower) / (upper - lower)
            } else {
                0.5
            },
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }
        data.windows(self.period).map(|w| self.bands(w)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}

/// Simple returns `p[i] / p[i-1] - 1`; zero prices contribute a zero return.
pub fn returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 })
        .collect()
}

/// Population standard deviation of simple returns, scaled by `annualization`.
///
/// `None` when fewer than two returns are available.
pub fn returns_volatility(prices: &[f64], annualization: f64) -> Option<f64> {
    let r = returns(prices);
    if r.len() < 2 {
        return None;
    }
    let sd = r.iter().population_std_dev();
    sd.is_finite().then_some(sd * annualization)
}
