//! Mini-batch gradient descent for [`BranchNetwork`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::error::ModelError;

use crate::network::BranchNetwork;
use crate::PredictiveModel;

/// One labelled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    /// 1.0 if price rose over the horizon, else 0.0
    pub label: f64,
    /// Realised future close minus current close
    pub price_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Weight of the price regression loss relative to the signal loss
    pub price_loss_weight: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            learning_rate: 0.01,
            batch_size: 32,
            price_loss_weight: 0.5,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.epochs == 0 {
            return Err(ModelError::Training("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ModelError::Training("batch_size must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::Training("learning_rate must be positive".into()));
        }
        if self.price_loss_weight < 0.0 {
            return Err(ModelError::Training("price_loss_weight cannot be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub samples: usize,
    /// Mean per-sample loss of the last epoch
    pub final_loss: f64,
    /// Fraction of samples whose direction the signal head gets right
    pub accuracy: f64,
}

/// Train `network` in place on `samples`.
///
/// Price targets are divided by their standard deviation and the network's
/// price scale is set to match, so predictions come back in price units.
pub fn train(
    network: &mut BranchNetwork,
    samples: &[TrainingSample],
    config: &TrainingConfig,
) -> Result<TrainingReport, ModelError> {
    config.validate()?;
    network.validate()?;
    if samples.is_empty() {
        return Err(ModelError::Training("no training samples".into()));
    }
    let input_len = network.input_len();
    if let Some(bad) = samples.iter().find(|s| s.features.len() != input_len) {
        return Err(ModelError::ShapeMismatch {
            expected: input_len,
            actual: bad.features.len(),
        });
    }
    if samples
        .iter()
        .any(|s| s.features.iter().any(|v| !v.is_finite()) || !s.price_delta.is_finite())
    {
        return Err(ModelError::NonFinite);
    }

    let scale = price_scale(samples);
    network.set_price_scale(scale);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..samples.len()).collect();
    let mut final_loss = 0.0;

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;

        for batch in order.chunks(config.batch_size) {
            let mut grads = network.zeros_like();
            for &i in batch {
                let sample = &samples[i];
                epoch_loss += network.backward(
                    &sample.features,
                    sample.label,
                    sample.price_delta / scale,
                    config.price_loss_weight,
                    &mut grads,
                );
            }
            network.apply_gradients(&grads, -config.learning_rate / batch.len() as f64);
        }

        final_loss = epoch_loss / samples.len() as f64;
        if !final_loss.is_finite() {
            return Err(ModelError::NonFinite);
        }
        debug!(epoch = epoch + 1, loss = final_loss, "Epoch complete");
    }

    let accuracy = accuracy(network, samples)?;
    info!(
        epochs = config.epochs,
        samples = samples.len(),
        loss = final_loss,
        accuracy,
        "Training complete"
    );

    Ok(TrainingReport {
        epochs: config.epochs,
        samples: samples.len(),
        final_loss,
        accuracy,
    })
}

fn price_scale(samples: &[TrainingSample]) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.price_delta).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|s| (s.price_delta - mean).powi(2))
        .sum::<f64>()
        / n;
    let sd = var.sqrt();
    if sd > f64::EPSILON {
        sd
    } else {
        1.0
    }
}

fn accuracy(network: &BranchNetwork, samples: &[TrainingSample]) -> Result<f64, ModelError> {
    let mut correct = 0usize;
    for sample in samples {
        let p = network.predict(&sample.features)?.probability;
        if (p > 0.5) == (sample.label > 0.5) {
            correct += 1;
        }
    }
    Ok(correct as f64 / samples.len() as f64)
}
