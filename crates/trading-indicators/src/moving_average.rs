//! Moving average indicators.
//!
//! Besides the compact [`Indicator`] outputs, [`ema_series`] works on
//! input-aligned series whose head may be undefined (NaN). Chained
//! smoothing (WaveTrend) relies on it.

use crate::simd::sum_simd;
use trading_core::traits::Indicator;

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let n = self.period as f64;
        let mut sum = sum_simd(&data[..self.period]);
        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        result.push(sum / n);

        for (old, new) in data.iter().zip(&data[self.period..]) {
            sum += new - old;
            result.push(sum / n);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA), seeded with the SMA of the first window.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Smoothing factor `2 / (period + 1)`.
    #[inline]
    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        ema_series(data, self.period)
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Input-aligned EMA. Leading NaNs in `data` are skipped; the first defined
/// output sits `period - 1` bars after the first defined input. Every output
/// before that is NaN.
pub fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if period == 0 {
        return out;
    }
    let Some(start) = data.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    if data.len() - start < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period;
    let mut ema = sum_simd(&data[start..seed_end]) / period as f64;
    out[seed_end - 1] = ema;

    for (slot, &value) in out[seed_end..].iter_mut().zip(&data[seed_end..]) {
        ema += alpha * (value - ema);
        *slot = ema;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(Sma::new(5).calculate(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let ema = Ema::new(3);
        let result = ema.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10);
        // 2 + 0.5 * (4 - 2)
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_ema_series_skips_leading_nan() {
        let data = [f64::NAN, f64::NAN, 1.0, 2.0, 3.0, 4.0];
        let out = ema_series(&data, 3);

        assert_eq!(out.len(), data.len());
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert!((out[4] - 2.0).abs() < 1e-10);
        assert!((out[5] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_ema_series_short_input() {
        assert!(ema_series(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
        assert!(ema_series(&[], 3).is_empty());
    }
}
