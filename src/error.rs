use thiserror::Error;

/// Errors produced while loading data, training, or writing artifacts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The dataset is malformed or does not contain what was asked for.
    #[error("data error: {0}")]
    Data(String),

    /// The hyperparameter file is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    #[error("plot error: {0}")]
    Plot(String),

    /// A loaded model does not fit the data it is applied to.
    #[error("shape mismatch: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, Error>;
