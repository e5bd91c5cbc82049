pub mod adam;
pub mod schedule;

pub use adam::Adam;
pub use schedule::ExponentialDecay;
