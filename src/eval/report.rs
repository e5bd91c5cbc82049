use std::path::Path;

use crate::data::stats::ColumnStats;
use crate::error::{Error, Result};
use crate::network::network::Network;

/// Column prefix for predicted values.
pub const PRED_PREFIX: &str = "Pred_";

/// Network predictions mapped back to original units.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// `Pred_<output>` for each output column.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Predictions {
    /// Predicts every row of `inputs` (normalized) and denormalizes the
    /// result with the statistics of the `outputs` columns.
    pub fn denormalized(
        network: &Network,
        inputs: &[Vec<f64>],
        stats: &ColumnStats,
        outputs: &[String],
    ) -> Result<Predictions> {
        let normalized = network.predict_batch(inputs);
        Ok(Predictions {
            columns: outputs.iter().map(|o| format!("{PRED_PREFIX}{o}")).collect(),
            rows: stats.denormalize_rows(&normalized, outputs)?,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Writes true targets next to predictions, one row per sample:
/// `<outputs...>,Pred_<outputs...>`.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    outputs: &[String],
    truth: &[Vec<f64>],
    predictions: &Predictions,
) -> Result<()> {
    if truth.len() != predictions.len() {
        return Err(Error::Shape(format!(
            "{} targets but {} predictions",
            truth.len(),
            predictions.len()
        )));
    }
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    let header: Vec<&str> = outputs
        .iter()
        .chain(predictions.columns.iter())
        .map(String::as_str)
        .collect();
    writer.write_record(&header)?;

    for (t, p) in truth.iter().zip(&predictions.rows) {
        let record: Vec<String> = t.iter().chain(p.iter()).map(|v| v.to_string()).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
