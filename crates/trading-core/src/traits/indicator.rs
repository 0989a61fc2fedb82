//! Indicator trait definitions.
//!
//! Batch indicators return one value per complete lookback window, so the
//! output is shorter than the input. An input shorter than the lookback
//! yields an empty vector rather than an error.

use crate::error::IndicatorError;

/// Trait for technical indicators over a single price column.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Multi-output indicator (e.g., Bollinger Bands).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Indicator that needs high, low and close columns (ADX, CCI, WaveTrend).
pub trait HlcIndicator: Send + Sync {
    /// Calculate indicator values. The three slices must have equal length.
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64>;

    /// Number of leading input bars that produce no output.
    fn lookback(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
