//! Adam optimizer over dense-layer parameters.

use crate::layers::dense::{Layer, LayerGradients};
use crate::math::matrix::Matrix;
use crate::optim::schedule::ExponentialDecay;

/// First and second moment estimates for one layer.
#[derive(Debug, Clone)]
struct Moments {
    m_weights: Matrix,
    v_weights: Matrix,
    m_biases: Matrix,
    v_biases: Matrix,
}

impl Moments {
    fn zeros_like(layer: &Layer) -> Moments {
        let (wr, wc) = (layer.weights.rows, layer.weights.cols);
        let (br, bc) = (layer.biases.rows, layer.biases.cols);
        Moments {
            m_weights: Matrix::zeros(wr, wc),
            v_weights: Matrix::zeros(wr, wc),
            m_biases: Matrix::zeros(br, bc),
            v_biases: Matrix::zeros(br, bc),
        }
    }
}

/// Adam with a scheduled learning rate.
///
/// ```text
/// m = β1·m + (1 − β1)·g
/// v = β2·v + (1 − β2)·g²
/// θ = θ − lr(t) · m̂ / (sqrt(v̂) + ε)
/// ```
/// `t` counts applied steps (one per mini-batch) and also drives the schedule.
#[derive(Debug, Clone)]
pub struct Adam {
    pub schedule: ExponentialDecay,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    iterations: u64,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(schedule: ExponentialDecay) -> Adam {
        Adam {
            schedule,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            iterations: 0,
            moments: Vec::new(),
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Learning rate the next step will use.
    pub fn current_learning_rate(&self) -> f64 {
        self.schedule.learning_rate(self.iterations)
    }

    /// Applies one update to every layer. `grads[i]` belongs to `layers[i]`.
    pub fn step(&mut self, layers: &mut [Layer], grads: &[LayerGradients]) {
        assert_eq!(layers.len(), grads.len(), "one gradient per layer");
        if self.moments.len() != layers.len() {
            self.moments = layers.iter().map(Moments::zeros_like).collect();
        }

        let lr = self.current_learning_rate();
        self.iterations += 1;
        let t = self.iterations.min(i32::MAX as u64) as i32;

        let rule = UpdateRule {
            lr,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1.powi(t),
            correction2: 1.0 - self.beta2.powi(t),
        };

        for ((layer, grad), moments) in layers.iter_mut().zip(grads).zip(self.moments.iter_mut()) {
            rule.apply(&mut layer.weights, &grad.weights, &mut moments.m_weights, &mut moments.v_weights);
            rule.apply(&mut layer.biases, &grad.biases, &mut moments.m_biases, &mut moments.v_biases);
        }
    }
}

/// Per-step constants shared by every parameter tensor.
struct UpdateRule {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    correction1: f64,
    correction2: f64,
}

impl UpdateRule {
    fn apply(&self, param: &mut Matrix, grad: &Matrix, m: &mut Matrix, v: &mut Matrix) {
        for (((p, g), m), v) in param.iter_mut().zip(grad.iter()).zip(m.iter_mut()).zip(v.iter_mut()) {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / self.correction1;
            let v_hat = *v / self.correction2;
            *p -= self.lr * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}
