//! Predictive model for the signal generator.
//!
//! The model maps a fixed-length feature vector to a signal probability
//! (chance of an up move) and a price-delta estimate. [`BranchNetwork`] is a
//! small multi-branch MLP: indicator, pattern and technical features each get
//! their own dense branch before a shared trunk and two heads.

pub mod layers;
pub mod network;
pub mod persistence;
pub mod training;

use serde::{Deserialize, Serialize};
use trading_core::error::ModelError;

pub use layers::{Activation, Dense};
pub use network::{BranchLayout, BranchNetwork, Segment};
pub use persistence::{ModelSnapshot, WEIGHTS_FORMAT_VERSION};
pub use training::{train, TrainingConfig, TrainingReport, TrainingSample};

/// Output of one inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability in [0, 1] that price moves up
    pub probability: f64,
    /// Expected price change in price units
    pub price_delta: f64,
}

/// Inference capability used by the signal generator.
pub trait PredictiveModel: Send + Sync {
    /// Feature vector length the model accepts.
    fn input_len(&self) -> usize;

    /// Run inference. A vector of the wrong length is rejected with
    /// [`ModelError::ShapeMismatch`].
    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError>;

    /// Model name for logging.
    fn name(&self) -> &str;
}
