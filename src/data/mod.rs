/// Data layer: CSV loading, min-max statistics and the train/test split.
///
/// ```text
///   CSV ──▶ Dataset ──▶ ColumnStats (min/max per column)
///              │              │
///              └──── split ───┴──▶ SplitData { train, test } (normalized)
/// ```

pub mod dataset;
pub mod split;
pub mod stats;

pub use dataset::Dataset;
pub use split::{split_indices, SplitData, SplitIndices, Subset, DEFAULT_TRAIN_FRACTION};
pub use stats::{ColumnStats, Range};
