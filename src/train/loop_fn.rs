use std::time::Instant;

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::Result;
use crate::eval::metrics::evaluate;
use crate::layers::dense::LayerGradients;
use crate::loss::mae::MaeLoss;
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::optim::adam::Adam;
use crate::train::callbacks::TrainCallback;
use crate::train::epoch_stats::{EpochStats, History};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with MSE loss for `config.epochs` epochs and returns the
/// per-epoch history.
///
/// # Arguments
/// - `network`     : mutable reference to the network; modified in place
/// - `optimizer`   : Adam optimizer; its step count carries over between calls
/// - `train_inputs`: training samples, each a `Vec<f64>` of length `input_size`
/// - `train_labels`: corresponding targets, same length as `train_inputs`
/// - `val_inputs`  : optional validation samples
/// - `val_labels`  : optional validation targets (required iff `val_inputs` is `Some`)
/// - `config`      : epochs, batch size and shuffling
/// - `callbacks`   : invoked after every step and epoch; an error stops training
///
/// # Panics
/// Panics if `train_inputs` is empty, lengths mismatch, or `batch_size == 0`.
#[allow(clippy::too_many_arguments)]
pub fn train_loop(
    network: &mut Network,
    optimizer: &mut Adam,
    train_inputs: &[Vec<f64>],
    train_labels: &[Vec<f64>],
    val_inputs: Option<&[Vec<f64>]>,
    val_labels: Option<&[Vec<f64>]>,
    config: &TrainConfig,
    callbacks: &mut [&mut dyn TrainCallback],
) -> Result<History> {
    assert!(!train_inputs.is_empty(), "train_inputs must not be empty");
    assert_eq!(
        train_inputs.len(),
        train_labels.len(),
        "train_inputs and train_labels must have equal length"
    );
    assert!(config.batch_size > 0, "batch_size must be at least 1");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = History::default();

    for cb in callbacks.iter_mut() {
        debug!("callback {} attached", cb.name());
        cb.on_train_begin(network)?;
    }

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (loss, mae) = run_one_epoch(
            network,
            optimizer,
            train_inputs,
            train_labels,
            config,
            &mut rng,
            callbacks,
        )?;

        let val = match (val_inputs, val_labels) {
            (Some(vi), Some(vl)) => Some(evaluate(network, vi, vl)),
            _ => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss,
            mse: loss,
            mae,
            val_loss: val.map(|v| v.loss),
            val_mse: val.map(|v| v.mse),
            val_mae: val.map(|v| v.mae),
            learning_rate: optimizer.current_learning_rate(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        info!("{}", format_epoch(&stats));

        for cb in callbacks.iter_mut() {
            cb.on_epoch_end(&stats, network)?;
        }
        history.push(stats);
    }

    for cb in callbacks.iter_mut() {
        cb.on_train_end(&history, network)?;
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch Adam over the training data.
/// Returns the mean (mse, mae) over all samples.
fn run_one_epoch(
    network: &mut Network,
    optimizer: &mut Adam,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    config: &TrainConfig,
    rng: &mut StdRng,
    callbacks: &mut [&mut dyn TrainCallback],
) -> Result<(f64, f64)> {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut total_mae = 0.0;

    let mut indices: Vec<usize> = (0..n).collect();
    if config.shuffle {
        indices.shuffle(rng);
    }

    for batch in indices.chunks(config.batch_size) {
        let mut acc_grads: Vec<LayerGradients> = network.layers.iter()
            .map(LayerGradients::zeros_like)
            .collect();

        for &idx in batch {
            let input    = &inputs[idx];
            let expected = &labels[idx];

            let output = network.forward(input);
            total_loss += MseLoss::loss(&output, expected);
            total_mae  += MaeLoss::loss(&output, expected);

            let grads = network.backward(input, MseLoss::derivative(&output, expected));
            for (acc, g) in acc_grads.iter_mut().zip(&grads) {
                acc.accumulate(g);
            }
        }

        let inv_batch = 1.0 / batch.len() as f64;
        let avg: Vec<LayerGradients> = acc_grads.iter().map(|g| g.scale(inv_batch)).collect();
        optimizer.step(&mut network.layers, &avg);

        let step = optimizer.iterations();
        for cb in callbacks.iter_mut() {
            cb.on_batch_end(step, network)?;
        }
    }

    Ok((total_loss / n as f64, total_mae / n as f64))
}

fn format_epoch(stats: &EpochStats) -> String {
    let mut line = format!(
        "Epoch {}/{} - {}ms - loss: {:.6} - mse: {:.6} - mae: {:.6}",
        stats.epoch, stats.total_epochs, stats.elapsed_ms, stats.loss, stats.mse, stats.mae
    );
    if let (Some(l), Some(m), Some(a)) = (stats.val_loss, stats.val_mse, stats.val_mae) {
        line.push_str(&format!(" - val_loss: {l:.6} - val_mse: {m:.6} - val_mae: {a:.6}"));
    }
    line.push_str(&format!(" - lr: {:.3e}", stats.learning_rate));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;
    use crate::optim::schedule::ExponentialDecay;

    /// y = (x0 + x1) / 2 on a grid in [0, 1]².
    fn linear_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                let (a, b) = (i as f64 / 7.0, j as f64 / 7.0);
                xs.push(vec![a, b]);
                ys.push(vec![(a + b) / 2.0]);
            }
        }
        (xs, ys)
    }

    struct CountingCallback {
        steps: Vec<u64>,
        epochs: usize,
        began: bool,
        ended: bool,
    }

    impl TrainCallback for CountingCallback {
        fn name(&self) -> &str {
            "counting"
        }
        fn on_train_begin(&mut self, _network: &Network) -> Result<()> {
            self.began = true;
            Ok(())
        }
        fn on_batch_end(&mut self, step: u64, _network: &Network) -> Result<()> {
            self.steps.push(step);
            Ok(())
        }
        fn on_epoch_end(&mut self, _stats: &EpochStats, _network: &Network) -> Result<()> {
            self.epochs += 1;
            Ok(())
        }
        fn on_train_end(&mut self, history: &History, _network: &Network) -> Result<()> {
            self.ended = history.len() == self.epochs;
            Ok(())
        }
    }

    #[test]
    fn loss_decreases_on_a_linear_target() {
        let (xs, ys) = linear_data();
        let mut net = Network::from_spec(&NetworkSpec::dense_regressor(2, 1), &mut StdRng::seed_from_u64(42));
        let mut adam = Adam::new(ExponentialDecay::new(0.01, 1000, 0.9, true));
        let config = TrainConfig::new(60, 4).with_seed(1);

        let history = train_loop(&mut net, &mut adam, &xs, &ys, Some(xs.as_slice()), Some(ys.as_slice()), &config, &mut []).unwrap();

        assert_eq!(history.len(), 60);
        let first = history.epochs[0].val_mse.unwrap();
        let last = history.last().unwrap().val_mse.unwrap();
        assert!(last < first, "val mse did not improve: {first} -> {last}");
        assert!(last < 0.02, "val mse too high: {last}");
    }

    #[test]
    fn callbacks_see_every_step_and_epoch() {
        let (xs, ys) = linear_data();
        let mut net = Network::from_spec(&NetworkSpec::dense_regressor(2, 1), &mut StdRng::seed_from_u64(1));
        let mut adam = Adam::new(ExponentialDecay::new(1e-3, 10, 0.5, true));
        let config = TrainConfig::new(3, 10);
        let mut counter = CountingCallback { steps: vec![], epochs: 0, began: false, ended: false };

        let history = {
            let mut cbs: [&mut dyn TrainCallback; 1] = [&mut counter];
            train_loop(&mut net, &mut adam, &xs, &ys, None, None, &config, &mut cbs).unwrap()
        };

        // 64 samples in batches of 10 → 7 steps per epoch.
        assert_eq!(counter.steps, (1..=21).collect::<Vec<u64>>());
        assert_eq!(counter.epochs, 3);
        assert!(counter.began && counter.ended);
        assert!(history.epochs.iter().all(|s| s.val_loss.is_none()));
        // Two decays after 21 steps with decay_steps = 10.
        assert!((history.last().unwrap().learning_rate - 2.5e-4).abs() < 1e-15);
    }

    #[test]
    fn training_is_reproducible_for_fixed_seeds() {
        let (xs, ys) = linear_data();
        let run = || {
            let mut net = Network::from_spec(&NetworkSpec::dense_regressor(2, 1), &mut StdRng::seed_from_u64(3));
            let mut adam = Adam::new(ExponentialDecay::new(1e-2, 100, 0.9, true));
            let config = TrainConfig::new(5, 1).with_seed(9);
            train_loop(&mut net, &mut adam, &xs, &ys, None, None, &config, &mut []).unwrap();
            net.predict(&[0.25, 0.75])
        };
        assert_eq!(run(), run());
    }
}
