use serde::{Serialize, Deserialize};

/// Exponential learning-rate decay driven by the optimizer step count.
///
/// ```text
/// lr(step) = initial_lr · decay_rate^(step / decay_steps)
/// ```
/// With `staircase` the exponent is floored, so the rate drops in discrete
/// intervals of `decay_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub initial_lr: f64,
    pub decay_steps: u64,
    pub decay_rate: f64,
    pub staircase: bool,
}

impl ExponentialDecay {
    pub fn new(initial_lr: f64, decay_steps: u64, decay_rate: f64, staircase: bool) -> Self {
        assert!(decay_steps > 0, "decay_steps must be at least 1");
        ExponentialDecay { initial_lr, decay_steps, decay_rate, staircase }
    }

    pub fn learning_rate(&self, step: u64) -> f64 {
        let mut exponent = step as f64 / self.decay_steps as f64;
        if self.staircase {
            exponent = exponent.floor();
        }
        self.initial_lr * self.decay_rate.powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::ExponentialDecay;

    #[test]
    fn staircase_holds_rate_within_interval() {
        let s = ExponentialDecay::new(1e-4, 3000, 0.9, true);
        assert_eq!(s.learning_rate(0), 1e-4);
        assert_eq!(s.learning_rate(2999), 1e-4);
        assert!((s.learning_rate(3000) - 0.9e-4).abs() < 1e-18);
        assert!((s.learning_rate(6500) - 0.81e-4).abs() < 1e-18);
    }

    #[test]
    fn continuous_decay_interpolates() {
        let s = ExponentialDecay::new(1.0, 10, 0.5, false);
        assert!((s.learning_rate(5) - 0.5f64.sqrt()).abs() < 1e-12);
    }
}
