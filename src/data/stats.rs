use serde::{Serialize, Deserialize};

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};

/// Min/max of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Maps `x` into [0, 1] relative to the range; a constant column maps to 0.
    pub fn normalize(&self, x: f64) -> f64 {
        let span = self.span();
        if span == 0.0 { 0.0 } else { (x - self.min) / span }
    }

    pub fn denormalize(&self, x: f64) -> f64 {
        x * self.span() + self.min
    }
}

/// Per-column min/max statistics used for min-max scaling.
///
/// Computed once from the full dataset and persisted with the model, so
/// predictions are mapped back with the same statistics used in training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub columns: Vec<(String, Range)>,
}

impl ColumnStats {
    pub fn from_dataset(dataset: &Dataset) -> Result<ColumnStats> {
        if dataset.is_empty() {
            return Err(Error::Data("cannot compute statistics of an empty dataset".into()));
        }
        let columns = dataset
            .column_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let range = dataset.rows().iter().map(|row| row[idx]).fold(
                    Range { min: f64::INFINITY, max: f64::NEG_INFINITY },
                    |r, x| Range { min: r.min.min(x), max: r.max.max(x) },
                );
                (name.clone(), range)
            })
            .collect();
        Ok(ColumnStats { columns })
    }

    pub fn range(&self, name: &str) -> Result<Range> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| *r)
            .ok_or_else(|| Error::Data(format!("no statistics for column '{name}'")))
    }

    fn ranges(&self, names: &[String]) -> Result<Vec<Range>> {
        names.iter().map(|n| self.range(n)).collect()
    }

    /// Normalizes rows whose values are laid out in `names` order.
    pub fn normalize_rows(&self, rows: &[Vec<f64>], names: &[String]) -> Result<Vec<Vec<f64>>> {
        let ranges = self.ranges(names)?;
        Ok(rows
            .iter()
            .map(|row| row.iter().zip(&ranges).map(|(&x, r)| r.normalize(x)).collect())
            .collect())
    }

    /// Inverse of `normalize_rows`.
    pub fn denormalize_rows(&self, rows: &[Vec<f64>], names: &[String]) -> Result<Vec<Vec<f64>>> {
        let ranges = self.ranges(names)?;
        Ok(rows
            .iter()
            .map(|row| row.iter().zip(&ranges).map(|(&x, r)| r.denormalize(x)).collect())
            .collect())
    }
}
