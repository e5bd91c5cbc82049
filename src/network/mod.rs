pub mod artifact;
pub mod network;
pub mod spec;

pub use artifact::ModelArtifact;
pub use network::Network;
pub use spec::{NetworkSpec, LayerSpec};
