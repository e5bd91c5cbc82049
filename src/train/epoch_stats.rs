use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Per-epoch training statistics emitted by `train_loop`.
///
/// Training metrics are running means over the epoch's samples, taken while
/// the weights are still being updated. Validation metrics are computed
/// after the epoch's last update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    pub loss: f64,
    pub mse: f64,
    pub mae: f64,
    pub val_loss: Option<f64>,
    pub val_mse: Option<f64>,
    pub val_mae: Option<f64>,
    /// Learning rate in effect at the end of the epoch.
    pub learning_rate: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Ordered record of every completed epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochStats>,
}

impl History {
    pub fn push(&mut self, stats: EpochStats) {
        self.epochs.push(stats);
    }

    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}
