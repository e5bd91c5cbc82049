pub mod metrics;
pub mod report;

pub use metrics::{evaluate, r2_score, Evaluation};
pub use report::{write_results, Predictions, PRED_PREFIX};
