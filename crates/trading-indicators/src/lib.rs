//! Technical indicators for signal generation.
//!
//! This crate provides the indicator library used to build model features:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, CCI, rate of change, WaveTrend)
//! - Trend strength (ADX, regression slope)
//! - Volatility (Bollinger Bands, return volatility)
//! - Normalized feature series with explicit "unavailable" results
//!
//! Hot loops use the SIMD kernels in [`simd`].

pub mod features;
pub mod momentum;
pub mod moving_average;
pub mod simd;
pub mod trend;
pub mod volatility;

pub use features::{calculate_feature, latest_feature, FeatureKind, FeatureSpec, NEUTRAL};
pub use momentum::{Cci, Roc, Rsi, WaveTrend};
pub use moving_average::{ema_series, Ema, Sma};
pub use trend::{regression_slope, Adx};
pub use volatility::{returns, returns_volatility, BollingerBands, BollingerOutput};
