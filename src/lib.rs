pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;
pub mod eval;
pub mod plot;
pub mod config;
pub mod error;
pub mod pipeline;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Network, NetworkSpec, ModelArtifact};
pub use loss::{MseLoss, MaeLoss};
pub use optim::{Adam, ExponentialDecay};
pub use train::{train_loop, EpochStats, History, TrainConfig, TrainCallback};
pub use data::{Dataset, ColumnStats, SplitData};
pub use eval::{evaluate, r2_score, Evaluation};
pub use config::HParams;
pub use error::{Error, Result};
pub use pipeline::{Algorithm, TestReport, TrainReport};
