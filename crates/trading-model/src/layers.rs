//! Dense layer with a fixed activation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use trading_indicators::simd::{axpy_simd, dot_product_simd};

/// Element-wise activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
}

impl Activation {
    #[inline]
    pub fn apply(&self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Activation::Linear => z,
        }
    }

    /// Derivative expressed through the pre-activation `z` and output `a`.
    #[inline]
    pub fn derivative(&self, z: f64, a: f64) -> f64 {
        match self {
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => a * (1.0 - a),
            Activation::Linear => 1.0,
        }
    }
}

/// Fully connected layer. `weights` is row-major `[outputs][inputs]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub inputs: usize,
    pub outputs: usize,
    pub activation: Activation,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
}

impl Dense {
    /// Xavier-uniform weights, zero bias.
    pub fn new<R: Rng>(inputs: usize, outputs: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();
        Self {
            inputs,
            outputs,
            activation,
            weights,
            bias: vec![0.0; outputs],
        }
    }

    /// Same shape, all parameters zero. Used as a gradient accumulator.
    pub fn zeros_like(other: &Dense) -> Self {
        Self {
            inputs: other.inputs,
            outputs: other.outputs,
            activation: other.activation,
            weights: vec![0.0; other.weights.len()],
            bias: vec![0.0; other.bias.len()],
        }
    }

    pub fn row(&self, j: usize) -> &[f64] {
        &self.weights[j * self.inputs..(j + 1) * self.inputs]
    }

    /// Pre-activations and activations for `x`.
    pub fn forward(&self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let z: Vec<f64> = (0..self.outputs)
            .map(|j| dot_product_simd(self.row(j), x) + self.bias[j])
            .collect();
        let a = z.iter().map(|&v| self.activation.apply(v)).collect();
        (z, a)
    }

    /// Accumulate gradients for output error `delta` (already multiplied by the
    /// activation derivative) and return the error propagated to the input.
    pub fn backward(&self, x: &[f64], delta: &[f64], grad: &mut Dense) -> Vec<f64> {
        let mut dx = vec![0.0; self.inputs];
        for (j, &d) in delta.iter().enumerate() {
            if d == 0.0 {
                continue;
            }
            grad.bias[j] += d;
            let row = j * self.inputs..(j + 1) * self.inputs;
            axpy_simd(d, x, &mut grad.weights[row.clone()]);
            axpy_simd(d, &self.weights[row], &mut dx);
        }
        dx
    }

    /// `self += scale * other`.
    pub fn add_scaled(&mut self, other: &Dense, scale: f64) {
        axpy_simd(scale, &other.weights, &mut self.weights);
        axpy_simd(scale, &other.bias, &mut self.bias);
    }

    /// Whether parameter buffers match the declared shape.
    pub fn is_well_formed(&self) -> bool {
        self.weights.len() == self.inputs * self.outputs && self.bias.len() == self.outputs
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}
