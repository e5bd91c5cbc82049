use serde::{Serialize, Deserialize};

use crate::loss::{mae::MaeLoss, mse::MseLoss};
use crate::network::network::Network;

/// Loss and metrics of a network over a dataset, averaged per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub mse: f64,
    pub mae: f64,
}

impl Evaluation {
    /// Average of loss, mse and mae.
    pub fn mean(&self) -> f64 {
        (self.loss + self.mse + self.mae) / 3.0
    }
}

/// Evaluates `network` sample by sample. An empty dataset scores zero.
pub fn evaluate(network: &Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Evaluation {
    assert_eq!(inputs.len(), targets.len(), "inputs and targets must have equal length");
    let n = inputs.len();
    if n == 0 {
        return Evaluation { loss: 0.0, mse: 0.0, mae: 0.0 };
    }

    let (mse, mae) = inputs.iter().zip(targets).fold((0.0, 0.0), |(mse, mae), (x, y)| {
        let p = network.predict(x);
        (mse + MseLoss::loss(&p, y), mae + MaeLoss::loss(&p, y))
    });
    let mse = mse / n as f64;
    Evaluation { loss: mse, mse, mae: mae / n as f64 }
}

/// Coefficient of determination per output, averaged uniformly.
///
/// A target column with zero variance scores 1.0 when predicted exactly and
/// 0.0 otherwise.
pub fn r2_score(y_true: &[Vec<f64>], y_pred: &[Vec<f64>]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "y_true and y_pred must have equal length");
    let n_outputs = y_true.first().map(|r| r.len()).unwrap_or(0);
    if y_true.is_empty() || n_outputs == 0 {
        return 0.0;
    }

    let per_output: Vec<f64> = (0..n_outputs)
        .map(|j| {
            let mean = y_true.iter().map(|r| r[j]).sum::<f64>() / y_true.len() as f64;
            let ss_tot: f64 = y_true.iter().map(|r| (r[j] - mean).powi(2)).sum();
            let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t[j] - p[j]).powi(2)).sum();
            if ss_tot == 0.0 {
                if ss_res == 0.0 { 1.0 } else { 0.0 }
            } else {
                1.0 - ss_res / ss_tot
            }
        })
        .collect();

    per_output.iter().sum::<f64>() / n_outputs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn r2_of_perfect_prediction_is_one() {
        let y = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 35.0]];
        assert!((r2_score(&y, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn r2_of_mean_prediction_is_zero() {
        let y = vec![vec![1.0], vec![2.0], vec![3.0]];
        let p = vec![vec![2.0]; 3];
        assert!(r2_score(&y, &p).abs() < 1e-12);
    }

    #[test]
    fn r2_averages_outputs_uniformly() {
        let y = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let p = vec![vec![1.0, 2.0], vec![2.0, 2.0], vec![3.0, 2.0]];
        assert!((r2_score(&y, &p) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn r2_of_constant_target() {
        let y = vec![vec![4.0]; 3];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(r2_score(&y, &vec![vec![5.0]; 3]), 0.0);
    }

    #[test]
    fn evaluation_matches_manual_losses() {
        let mut net = Network::from_spec(&NetworkSpec::dense_regressor(2, 1), &mut StdRng::seed_from_u64(2));
        // Zero the output layer so every prediction is its bias.
        let out = net.layers.last_mut().unwrap();
        out.weights = out.weights.map(|_| 0.0);
        out.biases = out.biases.map(|_| 1.0);

        let inputs = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let targets = vec![vec![0.0], vec![3.0]];
        let e = evaluate(&net, &inputs, &targets);
        assert_eq!(e.mse, (1.0 + 4.0) / 2.0);
        assert_eq!(e.loss, e.mse);
        assert_eq!(e.mae, (1.0 + 2.0) / 2.0);
        assert!((e.mean() - (2.5 + 2.5 + 1.5) / 3.0).abs() < 1e-12);
    }
}
