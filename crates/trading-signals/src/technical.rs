//! Bollinger/RSI technical summary.
//!
//! Scores the latest bar from -2 to +2: one point toward long for an
//! oversold RSI (< 30) or a close in the bottom fifth of the bands, one point
//! toward short for an overbought RSI (> 70) or a close in the top fifth.

use serde::{Deserialize, Serialize};
use trading_core::error::SignalError;
use trading_core::traits::Indicator;
use trading_indicators::{BollingerBands, Rsi};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const BAND_LOW: f64 = 0.2;
const BAND_HIGH: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub bollinger_length: usize,
    pub bollinger_std: f64,
    pub rsi_length: usize,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            bollinger_length: 20,
            bollinger_std: 2.0,
            rsi_length: 14,
        }
    }
}

impl TechnicalConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.bollinger_length < 2 {
            return Err(SignalError::InvalidConfig(
                "bollinger_length must be at least 2".into(),
            ));
        }
        if !(self.bollinger_std > 0.0) {
            return Err(SignalError::InvalidConfig("bollinger_std must be positive".into()));
        }
        if self.rsi_length == 0 {
            return Err(SignalError::InvalidConfig("rsi_length must be positive".into()));
        }
        Ok(())
    }
}

/// Technical state at the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSummary {
    /// `(close - lower) / (upper - lower)`
    pub bb_position: f64,
    /// `(upper - lower) / middle`
    pub bb_width: f64,
    /// RSI scaled to [0, 1]
    pub rsi: f64,
    /// Combined score in -2..=2
    pub tech_signal: i8,
    /// Expected move in price units: `close * bb_width * 0.1 * sign(score)`
    pub predicted_move: f64,
}

impl TechnicalSummary {
    /// The four model inputs, in order.
    pub fn as_features(&self) -> [f64; 4] {
        [
            self.bb_position,
            self.bb_width,
            self.rsi,
            f64::from(self.tech_signal),
        ]
    }

    /// Base confidence, independent of the model: `min(|score| / 2, 1)`.
    pub fn confidence(&self) -> f64 {
        (f64::from(self.tech_signal).abs() / 2.0).min(1.0)
    }
}

/// Score from raw RSI (0..100) and band position.
pub fn technical_signal(rsi: f64, bb_position: f64) -> i8 {
    let mut signal = 0;
    if rsi < RSI_OVERSOLD {
        signal += 1;
    } else if rsi > RSI_OVERBOUGHT {
        signal -= 1;
    }
    if bb_position < BAND_LOW {
        signal += 1;
    } else if bb_position > BAND_HIGH {
        signal -= 1;
    }
    signal
}

/// Computes [`TechnicalSummary`] from closes.
#[derive(Debug, Clone)]
pub struct TechnicalAnalyzer {
    bands: BollingerBands,
    rsi: Rsi,
    min_bars: usize,
}

impl TechnicalAnalyzer {
    pub fn new(config: &TechnicalConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self {
            bands: BollingerBands::with_params(config.bollinger_length, config.bollinger_std),
            rsi: Rsi::new(config.rsi_length),
            min_bars: config.bollinger_length.max(config.rsi_length + 1),
        })
    }

    pub fn min_bars(&self) -> usize {
        self.min_bars
    }

    /// Summary at the last close; `None` if the window is too short or the
    /// values are not finite.
    pub fn latest(&self, closes: &[f64]) -> Option<TechnicalSummary> {
        if closes.len() < self.min_bars {
            return None;
        }
        let bands = self.bands.latest(closes)?;
        let rsi = *self.rsi.calculate(closes).last()?;
        let close = *closes.last()?;
        if ![bands.percent_b, bands.bandwidth, rsi].iter().all(|v| v.is_finite()) {
            return None;
        }

        let tech_signal = technical_signal(rsi, bands.percent_b);
        let predicted_move = close * bands.bandwidth * 0.1 * f64::from(tech_signal.signum());
        Some(TechnicalSummary {
            bb_position: bands.percent_b,
            bb_width: bands.bandwidth,
            rsi: rsi / 100.0,
            tech_signal,
            predicted_move,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_signal_rules() {
        assert_eq!(technical_signal(25.0, 0.1), 2);
        assert_eq!(technical_signal(25.0, 0.5), 1);
        assert_eq!(technical_signal(50.0, 0.5), 0);
        assert_eq!(technical_signal(75.0, 0.9), -2);
        assert_eq!(technical_signal(75.0, 0.1), 0);
        // Boundaries are exclusive
        assert_eq!(technical_signal(30.0, 0.2), 0);
        assert_eq!(technical_signal(70.0, 0.8), 0);
    }

    #[test]
    fn test_uptrend_is_overbought() {
        let analyzer = TechnicalAnalyzer::new(&TechnicalConfig::default()).unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let summary = analyzer.latest(&closes).unwrap();

        assert_eq!(summary.tech_signal, -2);
        assert!((summary.rsi - 1.0).abs() < 1e-12);
        assert!(summary.bb_position > 0.8);
        assert!((summary.confidence() - 1.0).abs() < 1e-12);
        assert!(summary.predicted_move < 0.0);
    }

    #[test]
    fn test_flat_series_is_neutral() {
        let analyzer = TechnicalAnalyzer::new(&TechnicalConfig::default()).unwrap();
        let summary = analyzer.latest(&[50.0; 30]).unwrap();

        assert_eq!(summary.bb_position, 0.5);
        assert_eq!(summary.bb_width, 0.0);
        assert_eq!(summary.rsi, 0.5);
        assert_eq!(summary.tech_signal, 0);
        assert_eq!(summary.confidence(), 0.0);
        assert_eq!(summary.as_features(), [0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_short_window() {
        let analyzer = TechnicalAnalyzer::new(&TechnicalConfig::default()).unwrap();
        assert_eq!(analyzer.min_bars(), 20);
        assert!(analyzer.latest(&[1.0; 19]).is_none());
    }

    #[test]
    fn test_invalid_config() {
        let config = TechnicalConfig {
            bollinger_length: 1,
            ..Default::default()
        };
        assert!(TechnicalAnalyzer::new(&config).is_err());
    }
}
