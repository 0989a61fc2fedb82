//! Signal generation.
//!
//! Turns a window of bars into a trade decision:
//! - [`FeatureAssembler`] builds the model input from indicators, patterns
//!   and a Bollinger/RSI technical summary
//! - [`SignalGenerator`] runs the model, scores confidence, gates the
//!   candidate through ADX and regime filters and attaches exit levels
//! - [`build_training_set`] produces labelled samples for offline training

mod assembler;
mod composite;
mod dataset;
mod filters;
mod generator;
mod profile;
mod technical;

pub use assembler::{AssembledFeatures, FeatureAssembler, PATTERN_FEATURES, TECHNICAL_FEATURES};
pub use composite::{fractal_sub_signal, technical_sub_signal, CompositeSignal, CompositeWeights};
pub use dataset::build_training_set;
pub use filters::{AdxFilter, RegimeFilter, Rejection};
pub use generator::{Evaluation, MarketSnapshot, SignalConfig, SignalGenerator, SignalMode};
pub use profile::TimeframeProfile;
pub use technical::{technical_signal, TechnicalAnalyzer, TechnicalConfig, TechnicalSummary};
