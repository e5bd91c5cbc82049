use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::stats::ColumnStats;
use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;

pub const FORMAT_VERSION: u32 = 1;

/// A trained model together with everything needed to apply it to raw data:
/// which columns it reads and predicts, and the min/max statistics it was
/// trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub spec: NetworkSpec,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub stats: ColumnStats,
    pub network: Network,
}

impl ModelArtifact {
    pub fn new(
        spec: NetworkSpec,
        network: Network,
        inputs: Vec<String>,
        outputs: Vec<String>,
        stats: ColumnStats,
    ) -> ModelArtifact {
        ModelArtifact { format_version: FORMAT_VERSION, spec, inputs, outputs, stats, network }
    }

    /// Checks that the stored network and column lists agree.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Shape(format!(
                "unsupported model format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.network.input_size() != self.inputs.len()
            || self.network.output_size() != self.outputs.len()
        {
            return Err(Error::Shape(format!(
                "network maps {} -> {} values but the model lists {} inputs and {} outputs",
                self.network.input_size(),
                self.network.output_size(),
                self.inputs.len(),
                self.outputs.len()
            )));
        }
        Ok(())
    }

    /// Fails unless the model reads `inputs` and predicts `outputs`, in order.
    pub fn ensure_columns(&self, inputs: &[String], outputs: &[String]) -> Result<()> {
        if self.inputs != inputs || self.outputs != outputs {
            return Err(Error::Shape(format!(
                "model was trained on {:?} -> {:?}, not {:?} -> {:?}",
                self.inputs, self.outputs, inputs, outputs
            )));
        }
        Ok(())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<ModelArtifact> {
        let file = std::fs::File::open(path)?;
        let artifact: ModelArtifact = serde_json::from_reader(std::io::BufReader::new(file))?;
        artifact.validate()?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Dataset;
    use rand::{rngs::StdRng, SeedableRng};

    fn artifact() -> ModelArtifact {
        let ds = Dataset::new(vec!["a".into(), "b".into(), "y".into()], vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
        let spec = NetworkSpec::dense_regressor(2, 1);
        let network = Network::from_spec(&spec, &mut StdRng::seed_from_u64(4));
        ModelArtifact::new(
            spec,
            network,
            vec!["a".into(), "b".into()],
            vec!["y".into()],
            ColumnStats::from_dataset(&ds).unwrap(),
        )
    }

    #[test]
    fn save_and_load_keeps_stats_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let a = artifact();
        a.save_json(&path).unwrap();
        let b = ModelArtifact::load_json(&path).unwrap();
        assert_eq!(b.stats, a.stats);
        assert_eq!(b.spec, a.spec);
        assert_eq!(b.network.predict(&[0.5, 0.5]), a.network.predict(&[0.5, 0.5]));
    }

    #[test]
    fn column_mismatch_is_reported() {
        let a = artifact();
        a.ensure_columns(&["a".to_string(), "b".to_string()], &["y".to_string()]).unwrap();
        assert!(a.ensure_columns(&["b".to_string(), "a".to_string()], &["y".to_string()]).is_err());
    }

    #[test]
    fn inconsistent_artifact_fails_validation() {
        let mut a = artifact();
        a.inputs.push("c".into());
        assert!(matches!(a.validate(), Err(Error::Shape(_))));
    }
}
