use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = σ(x·W + b)`.
///
/// `weights` is shaped (input_size, size) and `biases` (1, size). The last
/// forward pass is cached for backprop and is not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    pub neurons: Matrix,
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = Wx + b) needed for correct derivative
}

/// Gradients of one layer for one sample (or averaged over a batch).
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl LayerGradients {
    pub fn zeros_like(layer: &Layer) -> LayerGradients {
        LayerGradients {
            weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
        }
    }

    pub fn accumulate(&mut self, other: &LayerGradients) {
        self.weights.add_assign(&other.weights);
        self.biases.add_assign(&other.biases);
    }

    pub fn scale(&self, factor: f64) -> LayerGradients {
        LayerGradients {
            weights: self.weights.scale(factor),
            biases: self.biases.scale(factor),
        }
    }
}

impl Layer {
    /// He-normal weights, zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        Layer {
            size,
            weights: Matrix::he_normal(input_size, size, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
            neurons: Matrix::zeros(1, size),
            pre_neurons: Matrix::zeros(1, size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    fn affine(&self, input: &[f64]) -> Matrix {
        assert_eq!(input.len(), self.weights.rows, "layer expects {} inputs", self.weights.rows);
        let x = Matrix::row_vector(input.to_vec());
        &(&x * &self.weights) + &self.biases
    }

    /// Forward pass that caches z and a for a following `compute_gradients`.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let z = self.affine(input);
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.neurons = a;
        self.neurons.data[0].clone()
    }

    /// Forward pass without touching the cache.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let z = self.affine(input);
        z.data[0].iter().map(|&x| self.activator.function(x)).collect()
    }

    /// Backprop through this layer using the cached forward pass.
    ///
    /// `delta` is ∂L/∂a for this layer's activations and `inputs` the 1×n row
    /// that was fed in. Returns the parameter gradients and ∂L/∂x for the
    /// previous layer.
    pub fn compute_gradients(&self, delta: &Matrix, inputs: &Matrix) -> (LayerGradients, Matrix) {
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let layer_delta = delta.hadamard(&act_derivative);

        let weights = &inputs.transpose() * &layer_delta;
        let input_delta = &layer_delta * &self.weights.transpose();

        (LayerGradients { weights, biases: layer_delta }, input_delta)
    }
}
