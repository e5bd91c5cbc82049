//! Hooks invoked by `train_loop` for checkpointing and run logging.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::network::network::Network;
use crate::train::epoch_stats::{EpochStats, History};

/// Custom behaviour at fixed points of the training loop.
///
/// Every method has a no-op default; an error aborts training.
pub trait TrainCallback {
    /// Short label used in training log lines.
    fn name(&self) -> &str;

    fn on_train_begin(&mut self, _network: &Network) -> Result<()> {
        Ok(())
    }

    /// Called after every optimizer step. `step` is the 1-based global step.
    fn on_batch_end(&mut self, _step: u64, _network: &Network) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _stats: &EpochStats, _network: &Network) -> Result<()> {
        Ok(())
    }

    fn on_train_end(&mut self, _history: &History, _network: &Network) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ModelCheckpoint
// ---------------------------------------------------------------------------

/// Saves the network weights every `save_freq` optimizer steps.
#[derive(Debug, Clone)]
pub struct ModelCheckpoint {
    path: PathBuf,
    save_freq: u64,
    saves: usize,
}

impl ModelCheckpoint {
    pub fn new<P: Into<PathBuf>>(path: P, save_freq: u64) -> Self {
        ModelCheckpoint { path: path.into(), save_freq, saves: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of checkpoints written so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl TrainCallback for ModelCheckpoint {
    fn name(&self) -> &str {
        "model_checkpoint"
    }

    fn on_batch_end(&mut self, step: u64, network: &Network) -> Result<()> {
        if self.save_freq == 0 || step % self.save_freq != 0 {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("step {step}: saving model weights to {}", self.path.display());
        network.save_json(&self.path)?;
        self.saves += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RunLogger
// ---------------------------------------------------------------------------

/// Summary of one parameter tensor at a point in training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TensorSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl TensorSummary {
    pub fn of<'a>(values: impl Iterator<Item = &'a f64>) -> TensorSummary {
        let values: Vec<f64> = values.copied().collect();
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        TensorSummary {
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std: var.sqrt(),
        }
    }
}

#[derive(Serialize)]
struct LayerSummary {
    epoch: usize,
    layer: usize,
    weights: TensorSummary,
    biases: TensorSummary,
}

/// Writes a per-run log directory named after the start time.
///
/// `epochs.jsonl` receives one line per epoch. Every `histogram_freq`
/// epochs a summary of each layer's parameters is appended to
/// `weights.jsonl`; `0` disables the summaries.
pub struct RunLogger {
    run_dir: PathBuf,
    histogram_freq: usize,
    epochs: BufWriter<File>,
}

impl RunLogger {
    /// Creates `<root>/<YYYYmmdd-HHMMSS>/`, adding `-1`, `-2`, ... when a
    /// run started in the same second already owns that name.
    pub fn create<P: AsRef<Path>>(root: P, histogram_freq: usize) -> Result<RunLogger> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut suffix = 0usize;
        loop {
            let name = if suffix == 0 { stamp.clone() } else { format!("{stamp}-{suffix}") };
            let run_dir = root.join(name);
            match fs::create_dir(&run_dir) {
                Ok(()) => return RunLogger::open(run_dir, histogram_freq),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn open(run_dir: PathBuf, histogram_freq: usize) -> Result<RunLogger> {
        let epochs = BufWriter::new(File::create(run_dir.join("epochs.jsonl"))?);
        info!("logging run to {}", run_dir.display());
        Ok(RunLogger { run_dir, histogram_freq, epochs })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn write_weight_summaries(&self, epoch: usize, network: &Network) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.run_dir.join("weights.jsonl"))?;
        let mut out = BufWriter::new(file);
        for (layer, l) in network.layers.iter().enumerate() {
            let line = LayerSummary {
                epoch,
                layer,
                weights: TensorSummary::of(l.weights.iter()),
                biases: TensorSummary::of(l.biases.iter()),
            };
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl TrainCallback for RunLogger {
    fn name(&self) -> &str {
        "run_logger"
    }

    fn on_epoch_end(&mut self, stats: &EpochStats, network: &Network) -> Result<()> {
        serde_json::to_writer(&mut self.epochs, stats)?;
        self.epochs.write_all(b"\n")?;
        self.epochs.flush()?;

        if self.histogram_freq > 0 && stats.epoch % self.histogram_freq == 0 {
            self.write_weight_summaries(stats.epoch, network)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;
    use rand::{rngs::StdRng, SeedableRng};

    fn network() -> Network {
        Network::from_spec(&NetworkSpec::dense_regressor(3, 1), &mut StdRng::seed_from_u64(5))
    }

    fn stats(epoch: usize) -> EpochStats {
        EpochStats {
            epoch,
            total_epochs: 4,
            loss: 0.5,
            mse: 0.5,
            mae: 0.4,
            val_loss: Some(0.6),
            val_mse: Some(0.6),
            val_mae: Some(0.45),
            learning_rate: 1e-3,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn checkpoint_saves_on_multiples_of_save_freq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt").join("weights.json");
        let mut cb = ModelCheckpoint::new(&path, 3);
        let net = network();
        for step in 1..=7 {
            cb.on_batch_end(step, &net).unwrap();
        }
        assert_eq!(cb.saves(), 2);
        let restored = Network::load_json(&path).unwrap();
        assert_eq!(restored.predict(&[0.1, 0.2, 0.3]), net.predict(&[0.1, 0.2, 0.3]));
    }

    #[test]
    fn run_logger_writes_epochs_and_periodic_weight_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::create(dir.path(), 2).unwrap();
        let run_dir = logger.run_dir().to_path_buf();
        assert!(run_dir.starts_with(dir.path()));

        let net = network();
        for epoch in 1..=4 {
            logger.on_epoch_end(&stats(epoch), &net).unwrap();
        }

        let epochs = fs::read_to_string(run_dir.join("epochs.jsonl")).unwrap();
        let lines: Vec<&str> = epochs.lines().collect();
        assert_eq!(lines.len(), 4);
        let first: EpochStats = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, stats(1));

        let weights = fs::read_to_string(run_dir.join("weights.jsonl")).unwrap();
        // Epochs 2 and 4, one line per layer.
        assert_eq!(weights.lines().count(), 2 * net.layers.len());
    }

    #[test]
    fn runs_started_together_get_separate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("logs");
        let first = RunLogger::create(&root, 1).unwrap();
        let second = RunLogger::create(&root, 1).unwrap();
        assert_ne!(first.run_dir(), second.run_dir());
        assert!(first.run_dir().join("epochs.jsonl").exists());
        assert!(second.run_dir().join("epochs.jsonl").exists());
    }

    #[test]
    fn tensor_summary_statistics() {
        let s = TensorSummary::of([1.0, 3.0].iter());
        assert_eq!(s, TensorSummary { min: 1.0, max: 3.0, mean: 2.0, std: 1.0 });
    }
}
