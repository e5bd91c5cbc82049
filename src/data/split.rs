use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::Dataset;
use crate::data::stats::ColumnStats;
use crate::error::{Error, Result};

/// Fraction of rows sampled into the training split.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.85;

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Sampled rows, in sampling order.
    pub train: Vec<usize>,
    /// Remaining rows, in dataset order.
    pub test: Vec<usize>,
}

/// Samples `round(n · train_fraction)` rows (halves to even) without replacement for
/// training; the rest form the test split. Deterministic for a given seed.
pub fn split_indices(n: usize, train_fraction: f64, seed: u64) -> SplitIndices {
    assert!(
        train_fraction > 0.0 && train_fraction < 1.0,
        "train_fraction must lie in (0, 1)"
    );
    let n_train = ((n as f64) * train_fraction).round_ties_even() as usize;

    let mut shuffled: Vec<usize> = (0..n).collect();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
    let train: Vec<usize> = shuffled[..n_train].to_vec();

    let mut in_train = vec![false; n];
    for &i in &train {
        in_train[i] = true;
    }
    let test = (0..n).filter(|&i| !in_train[i]).collect();

    SplitIndices { train, test }
}

/// One side of a split, ready to feed to the network.
#[derive(Debug, Clone)]
pub struct Subset {
    /// Normalized inputs.
    pub inputs: Vec<Vec<f64>>,
    /// Normalized targets.
    pub targets: Vec<Vec<f64>>,
    /// Targets in original units.
    pub raw_targets: Vec<Vec<f64>>,
}

impl Subset {
    fn build(
        dataset: &Dataset,
        stats: &ColumnStats,
        rows: &[usize],
        inputs: &[String],
        outputs: &[String],
    ) -> Result<Subset> {
        let part = dataset.take_rows(rows)?;
        let raw_inputs = part.select(inputs)?;
        let raw_targets = part.select(outputs)?;
        Ok(Subset {
            inputs: stats.normalize_rows(&raw_inputs, inputs)?,
            targets: stats.normalize_rows(&raw_targets, outputs)?,
            raw_targets,
        })
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Normalized train and test subsets of a dataset.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub train: Subset,
    pub test: Subset,
}

impl SplitData {
    pub fn new(
        dataset: &Dataset,
        stats: &ColumnStats,
        inputs: &[String],
        outputs: &[String],
        train_fraction: f64,
        seed: u64,
    ) -> Result<SplitData> {
        let idx = split_indices(dataset.len(), train_fraction, seed);
        if idx.train.is_empty() || idx.test.is_empty() {
            return Err(Error::Data(format!(
                "{} rows are too few for a {:.0}/{:.0} split",
                dataset.len(),
                train_fraction * 100.0,
                (1.0 - train_fraction) * 100.0
            )));
        }
        Ok(SplitData {
            train: Subset::build(dataset, stats, &idx.train, inputs, outputs)?,
            test: Subset::build(dataset, stats, &idx.test, inputs, outputs)?,
        })
    }
}
