pub mod charts;

pub use charts::{plot_history, plot_r2};
