//! Momentum indicators: RSI, CCI, rate of change and WaveTrend.

use crate::moving_average::{ema_series, Sma};
use trading_core::traits::{HlcIndicator, Indicator};

/// Relative Strength Index (RSI) with Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let p = self.period as f64;
        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let mut avg_gain = gains[..self.period].iter().sum::<f64>() / p;
        let mut avg_loss = losses[..self.period].iter().sum::<f64>() / p;

        let rsi = |gain: f64, loss: f64| {
            if gain + loss == 0.0 {
                50.0
            } else {
                100.0 * gain / (gain + loss)
            }
        };

        let mut result = Vec::with_capacity(data.len() - self.period);
        result.push(rsi(avg_gain, avg_loss));

        for (&gain, &loss) in gains[self.period..].iter().zip(&losses[self.period..]) {
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
            result.push(rsi(avg_gain, avg_loss));
        }

        result
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// Commodity Channel Index over the typical price.
#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }
}

impl HlcIndicator for Cci {
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let typical: Vec<f64> = high
            .iter()
            .zip(low)
            .zip(close)
            .map(|((h, l), c)| (h + l + c) / 3.0)
            .collect();
        let means = Sma::new(self.period).calculate(&typical);

        typical
            .windows(self.period)
            .zip(means)
            .map(|(window, mean)| {
                let deviation =
                    window.iter().map(|v| (v - mean).abs()).sum::<f64>() / self.period as f64;
                let last = window[self.period - 1];
                if deviation == 0.0 {
                    0.0
                } else {
                    (last - mean) / (0.015 * deviation)
                }
            })
            .collect()
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "CCI"
    }
}

/// Rate of change: `(close - close[n]) / close[n]`.
#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Roc {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }
        data.iter()
            .zip(&data[self.period..])
            .map(|(&base, &now)| if base == 0.0 { 0.0 } else { (now - base) / base })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ROC"
    }
}

/// WaveTrend oscillator, reported as the `wt1 - wt2` histogram.
///
/// `esa = EMA(hlc3, a)`, `d = EMA(|hlc3 - esa|, a)`,
/// `ci = (hlc3 - esa) / (0.015 d)`, `wt1 = EMA(ci, b)`, `wt2 = EMA(wt1, 4)`.
#[derive(Debug, Clone)]
pub struct WaveTrend {
    channel_length: usize,
    average_length: usize,
}

impl WaveTrend {
    const SIGNAL_LENGTH: usize = 4;

    pub fn new(channel_length: usize, average_length: usize) -> Self {
        assert!(
            channel_length > 0 && average_length > 0,
            "Lengths must be greater than 0"
        );
        Self {
            channel_length,
            average_length,
        }
    }

    /// Input-aligned histogram; undefined warm-up entries are NaN.
    pub fn series(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let hlc3: Vec<f64> = high
            .iter()
            .zip(low)
            .zip(close)
            .map(|((h, l), c)| (h + l + c) / 3.0)
            .collect();

        let esa = ema_series(&hlc3, self.channel_length);
        let abs_dev: Vec<f64> = hlc3.iter().zip(&esa).map(|(p, e)| (p - e).abs()).collect();
        let d = ema_series(&abs_dev, self.channel_length);

        let ci: Vec<f64> = hlc3
            .iter()
            .zip(&esa)
            .zip(&d)
            .map(|((p, e), d)| {
                if d.is_nan() {
                    f64::NAN
                } else if *d == 0.0 {
                    0.0
                } else {
                    (p - e) / (0.015 * d)
                }
            })
            .collect();

        let wt1 = ema_series(&ci, self.average_length);
        let wt2 = ema_series(&wt1, Self::SIGNAL_LENGTH);
        wt1.iter().zip(&wt2).map(|(a, b)| a - b).collect()
    }
}

impl HlcIndicator for WaveTrend {
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        self.series(high, low, close)
            .into_iter()
            .skip(self.lookback())
            .collect()
    }

    fn lookback(&self) -> usize {
        2 * (self.channel_length - 1) + (self.average_length - 1) + (Self::SIGNAL_LENGTH - 1)
    }

    fn name(&self) -> &str {
        "WT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect()
    }

    #[test]
    fn test_rsi_all_gains() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14).calculate(&data);

        assert_eq!(result.len(), 6);
        assert!((result[0] - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_bounds() {
        let result = Rsi::new(14).calculate(&wave(60));
        assert!(!result.is_empty());
        assert!(result.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let result = Rsi::new(5).calculate(&[10.0; 8]);
        assert!(result.iter().all(|v| (*v - 50.0).abs() < 1e-12));
    }

    #[test]
    fn test_cci_constant_series_is_zero() {
        let flat = vec![50.0; 30];
        let result = Cci::new(20).calculate(&flat, &flat, &flat);
        assert_eq!(result.len(), 11);
        assert!(result.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_cci_sign_follows_trend() {
        let up: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = Cci::new(20).calculate(&up, &up, &up);
        assert!(result.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_roc() {
        let result = Roc::new(2).calculate(&[100.0, 105.0, 110.0, 99.0]);
        assert_eq!(result.len(), 2);
        assert!((result[0] - 0.10).abs() < 1e-12);
        assert!((result[1] + 0.057142857).abs() < 1e-6);
        assert!(Roc::new(5).calculate(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_wavetrend_warmup() {
        let wt = WaveTrend::new(10, 12);
        let data = wave(40);
        let series = wt.series(&data, &data, &data);

        assert_eq!(series.len(), 40);
        assert_eq!(wt.lookback(), 32);
        assert!(series[..32].iter().all(|v| v.is_nan()));
        assert!(series[32..].iter().all(|v| v.is_finite()));
        assert_eq!(HlcIndicator::calculate(&wt, &data, &data, &data).len(), 8);
    }

    #[test]
    fn test_wavetrend_short_input_is_empty() {
        let wt = WaveTrend::new(10, 12);
        let data = wave(20);
        assert!(HlcIndicator::calculate(&wt, &data, &data, &data).is_empty());
    }
}
