//! Multi-branch dual-head network.
//!
//! ```text
//! indicators ─ Dense(64, relu) ─┐
//! patterns   ─ Dense(32, relu) ─┼─ concat ─ Dense(64) ─ Dense(32) ─┬─ signal (sigmoid)
//! technical  ─ Dense(32, relu) ─┘                                  └─ price  (linear)
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use trading_core::error::ModelError;

use crate::layers::{Activation, Dense};
use crate::{Prediction, PredictiveModel};

const PROB_EPS: f64 = 1e-12;

/// One input slice routed to its own dense branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub len: usize,
    pub units: usize,
}

/// How the input vector is split across branches, plus trunk widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchLayout {
    pub segments: Vec<Segment>,
    pub trunk: Vec<usize>,
}

impl BranchLayout {
    /// `indicator_count` indicator inputs, then 3 pattern and 4 technical inputs.
    pub fn for_features(indicator_count: usize) -> Self {
        Self {
            segments: vec![
                Segment { start: 0, len: indicator_count, units: 64 },
                Segment { start: indicator_count, len: 3, units: 32 },
                Segment { start: indicator_count + 3, len: 4, units: 32 },
            ],
            trunk: vec![64, 32],
        }
    }

    pub fn input_len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    fn concat_len(&self) -> usize {
        self.segments.iter().map(|s| s.units).sum()
    }
}

impl Default for BranchLayout {
    fn default() -> Self {
        Self::for_features(4)
    }
}

/// Activations of one forward pass, kept for backpropagation.
struct ForwardCache {
    branch_z: Vec<Vec<f64>>,
    concat: Vec<f64>,
    trunk_z: Vec<Vec<f64>>,
    trunk_a: Vec<Vec<f64>>,
    signal: f64,
    price: f64,
}

/// Branching MLP implementing [`PredictiveModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchNetwork {
    layout: BranchLayout,
    branches: Vec<Dense>,
    trunk: Vec<Dense>,
    signal_head: Dense,
    price_head: Dense,
    /// Price targets are learned divided by this scale
    price_scale: f64,
}

impl BranchNetwork {
    /// Freshly initialised network with a deterministic seed.
    pub fn new(layout: BranchLayout, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let branches = layout
            .segments
            .iter()
            .map(|s| Dense::new(s.len, s.units, Activation::Relu, &mut rng))
            .collect();

        let mut trunk = Vec::with_capacity(layout.trunk.len());
        let mut width = layout.concat_len();
        for &units in &layout.trunk {
            trunk.push(Dense::new(width, units, Activation::Relu, &mut rng));
            width = units;
        }

        Self {
            signal_head: Dense::new(width, 1, Activation::Sigmoid, &mut rng),
            price_head: Dense::new(width, 1, Activation::Linear, &mut rng),
            layout,
            branches,
            trunk,
            price_scale: 1.0,
        }
    }

    pub fn layout(&self) -> &BranchLayout {
        &self.layout
    }

    pub fn price_scale(&self) -> f64 {
        self.price_scale
    }

    pub fn set_price_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.price_scale = scale;
        }
    }

    /// Every layer in a fixed order.
    pub fn layers(&self) -> impl Iterator<Item = &Dense> {
        self.branches
            .iter()
            .chain(self.trunk.iter())
            .chain(std::iter::once(&self.signal_head))
            .chain(std::iter::once(&self.price_head))
    }

    fn layers_mut(&mut self) -> impl Iterator<Item = &mut Dense> {
        self.branches
            .iter_mut()
            .chain(self.trunk.iter_mut())
            .chain(std::iter::once(&mut self.signal_head))
            .chain(std::iter::once(&mut self.price_head))
    }

    pub fn parameter_count(&self) -> usize {
        self.layers().map(Dense::parameter_count).sum()
    }

    /// Same architecture with all parameters zeroed.
    pub fn zeros_like(&self) -> Self {
        Self {
            layout: self.layout.clone(),
            branches: self.branches.iter().map(Dense::zeros_like).collect(),
            trunk: self.trunk.iter().map(Dense::zeros_like).collect(),
            signal_head: Dense::zeros_like(&self.signal_head),
            price_head: Dense::zeros_like(&self.price_head),
            price_scale: self.price_scale,
        }
    }

    /// `self += scale * grads`, layer by layer.
    pub fn apply_gradients(&mut self, grads: &BranchNetwork, scale: f64) {
        for (layer, grad) in self.layers_mut().zip(grads.layers()) {
            layer.add_scaled(grad, scale);
        }
    }

    /// Check that parameter buffers and layer widths agree with the layout.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mismatch = |expected: usize, actual: usize| ModelError::ShapeMismatch { expected, actual };

        if self.branches.len() != self.layout.segments.len() {
            return Err(mismatch(self.layout.segments.len(), self.branches.len()));
        }
        for (segment, branch) in self.layout.segments.iter().zip(&self.branches) {
            if branch.inputs != segment.len {
                return Err(mismatch(segment.len, branch.inputs));
            }
        }
        let mut width = self.branches.iter().map(|b| b.outputs).sum::<usize>();
        for layer in &self.trunk {
            if layer.inputs != width {
                return Err(mismatch(width, layer.inputs));
            }
            width = layer.outputs;
        }
        for head in [&self.signal_head, &self.price_head] {
            if head.inputs != width {
                return Err(mismatch(width, head.inputs));
            }
            if head.outputs != 1 {
                return Err(mismatch(1, head.outputs));
            }
        }
        for layer in self.layers() {
            if !layer.is_well_formed() {
                return Err(mismatch(layer.inputs * layer.outputs, layer.weights.len()));
            }
        }
        Ok(())
    }

    fn forward(&self, x: &[f64]) -> ForwardCache {
        let mut branch_z = Vec::with_capacity(self.branches.len());
        let mut concat = Vec::with_capacity(self.layout.concat_len());
        for (segment, branch) in self.layout.segments.iter().zip(&self.branches) {
            let (z, a) = branch.forward(&x[segment.start..segment.start + segment.len]);
            branch_z.push(z);
            concat.extend(a);
        }

        let mut trunk_z = Vec::with_capacity(self.trunk.len());
        let mut trunk_a: Vec<Vec<f64>> = Vec::with_capacity(self.trunk.len());
        for layer in &self.trunk {
            let input = trunk_a.last().unwrap_or(&concat);
            let (z, a) = layer.forward(input);
            trunk_z.push(z);
            trunk_a.push(a);
        }

        let hidden = trunk_a.last().unwrap_or(&concat);
        let signal = self.signal_head.forward(hidden).1[0];
        let price = self.price_head.forward(hidden).1[0];

        ForwardCache {
            branch_z,
            concat,
            trunk_z,
            trunk_a,
            signal,
            price,
        }
    }

    /// Accumulate gradients for one sample into `grads` and return its loss.
    ///
    /// Loss is binary cross-entropy on the signal head plus
    /// `price_weight * 0.5 * (price - target)^2` on the scaled price head.
    pub fn backward(
        &self,
        x: &[f64],
        label: f64,
        scaled_price_target: f64,
        price_weight: f64,
        grads: &mut BranchNetwork,
    ) -> f64 {
        let cache = self.forward(x);
        let s = cache.signal.clamp(PROB_EPS, 1.0 - PROB_EPS);
        let price_err = cache.price - scaled_price_target;
        let loss = -(label * s.ln() + (1.0 - label) * (1.0 - s).ln())
            + price_weight * 0.5 * price_err * price_err;

        let hidden = cache.trunk_a.last().unwrap_or(&cache.concat);
        let mut dh = self
            .signal_head
            .backward(hidden, &[cache.signal - label], &mut grads.signal_head);
        let dh_price = self
            .price_head
            .backward(hidden, &[price_weight * price_err], &mut grads.price_head);
        for (a, b) in dh.iter_mut().zip(dh_price) {
            *a += b;
        }

        for k in (0..self.trunk.len()).rev() {
            let layer = &self.trunk[k];
            let delta: Vec<f64> = dh
                .iter()
                .zip(&cache.trunk_z[k])
                .zip(&cache.trunk_a[k])
                .map(|((d, &z), &a)| d * layer.activation.derivative(z, a))
                .collect();
            let input = if k == 0 { &cache.concat } else { &cache.trunk_a[k - 1] };
            dh = layer.backward(input, &delta, &mut grads.trunk[k]);
        }

        let mut offset = 0;
        for (k, (segment, branch)) in self.layout.segments.iter().zip(&self.branches).enumerate() {
            let z = &cache.branch_z[k];
            let delta: Vec<f64> = dh[offset..offset + branch.outputs]
                .iter()
                .zip(z)
                .map(|(d, &z)| d * branch.activation.derivative(z, branch.activation.apply(z)))
                .collect();
            branch.backward(
                &x[segment.start..segment.start + segment.len],
                &delta,
                &mut grads.branches[k],
            );
            offset += branch.outputs;
        }

        loss
    }
}

impl PredictiveModel for BranchNetwork {
    fn input_len(&self) -> usize {
        self.layout.input_len()
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        if features.len() != self.input_len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_len(),
                actual: features.len(),
            });
        }
        let cache = self.forward(features);
        let price_delta = cache.price * self.price_scale;
        if !cache.signal.is_finite() || !price_delta.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(Prediction {
            probability: cache.signal.clamp(0.0, 1.0),
            price_delta,
        })
    }

    fn name(&self) -> &str {
        "branch-mlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = BranchLayout::default();
        assert_eq!(layout.input_len(), 11);
        assert_eq!(layout.concat_len(), 128);
    }

    #[test]
    fn test_predict_shape_mismatch() {
        let net = BranchNetwork::new(BranchLayout::default(), 1);
        let err = net.predict(&[0.0; 10]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 11, actual: 10 }));
    }

    #[test]
    fn test_predict_bounds_and_determinism() {
        let a = BranchNetwork::new(BranchLayout::default(), 42);
        let b = BranchNetwork::new(BranchLayout::default(), 42);
        let x = [0.3, 0.7, 0.2, 0.15, 3.0, -1.0, 0.8, 0.4, 0.01, 0.55, 1.0];

        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        assert_eq!(pa, pb);
        assert!((0.0..=1.0).contains(&pa.probability));
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let net = BranchNetwork::new(BranchLayout::for_features(2), 3);
        let x = [0.4, 0.9, 1.0, 2.0, 0.5, 0.3, 0.6, 0.05, -1.0];
        let (label, target, weight) = (1.0, 0.2, 0.5);

        let mut grads = net.zeros_like();
        net.backward(&x, label, target, weight, &mut grads);

        let loss_with = |network: &BranchNetwork| {
            let mut scratch = network.zeros_like();
            network.backward(&x, label, target, weight, &mut scratch)
        };

        let h = 1e-6;
        let mut plus = net.clone();
        plus.signal_head.bias[0] += h;
        let mut minus = net.clone();
        minus.signal_head.bias[0] -= h;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * h);
        assert!((numeric - grads.signal_head.bias[0]).abs() < 1e-5);

        let mut plus = net.clone();
        plus.trunk[0].bias[0] += h;
        let mut minus = net.clone();
        minus.trunk[0].bias[0] -= h;
        let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * h);
        assert!((numeric - grads.trunk[0].bias[0]).abs() < 1e-5);
    }

    #[test]
    fn test_validate_detects_corruption() {
        let mut net = BranchNetwork::new(BranchLayout::default(), 5);
        net.trunk[1].weights.pop();
        assert!(net.validate().is_err());
    }
}
