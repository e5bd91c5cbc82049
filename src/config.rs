//! Hyperparameters and file locations of an experiment run.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::data::split::DEFAULT_TRAIN_FRACTION;
use crate::error::{Error, Result};

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Experiment configuration, loadable from JSON. Missing keys take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HParams {
    /// Names of the CSV columns, in file order.
    pub columns: Vec<String>,
    /// Columns fed to the network.
    pub inputs: Vec<String>,
    /// Columns the network predicts.
    pub outputs: Vec<String>,
    pub data_path: PathBuf,
    /// Directory holding the trained model and its checkpoint.
    pub model_dir: PathBuf,
    /// Root directory for per-run training logs.
    pub log_dir: PathBuf,
    /// CSV written by the test run.
    pub result_path: PathBuf,
    pub plot_dir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    /// Initial learning rate.
    pub lr: f64,
    pub decay_steps: u64,
    pub decay_rate: f64,
    /// Seed for the split, weight init and shuffling.
    pub random_state: u64,
    pub train_fraction: f64,
    /// Optimizer steps between checkpoints; 0 disables checkpointing.
    pub save_freq: u64,
    /// Epochs between weight summaries in the run log; 0 disables them.
    pub histogram_freq: usize,
}

impl Default for HParams {
    fn default() -> Self {
        HParams {
            columns: strings(&["Orifice diameter", "Time 1", "PPM 1", "Time 2", "PPM 2", "Effect", "Power"]),
            inputs: strings(&["Orifice diameter", "Time 1", "PPM 1", "Time 2", "PPM 2"]),
            outputs: strings(&["Effect", "Power"]),
            data_path: PathBuf::from("data/Consequence_211104_mod.csv"),
            model_dir: PathBuf::from("data/orifice_weight"),
            log_dir: PathBuf::from("data/Learning_log"),
            result_path: PathBuf::from("data/result_test_Servelity.csv"),
            plot_dir: PathBuf::from("data/plots"),
            epochs: 300,
            batch_size: 1,
            lr: 1e-4,
            decay_steps: 3000,
            decay_rate: 0.9,
            random_state: 1,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            save_freq: 3000,
            histogram_freq: 100,
        }
    }
}

impl HParams {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<HParams> {
        let file = std::fs::File::open(path)?;
        let hparams: HParams = serde_json::from_reader(std::io::BufReader::new(file))?;
        hparams.validate()?;
        Ok(hparams)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(Error::Config("inputs and outputs must not be empty".into()));
        }
        if let Some(missing) = self.inputs.iter().chain(&self.outputs).find(|c| !self.columns.contains(c)) {
            return Err(Error::Config(format!("column '{missing}' is not listed in columns")));
        }
        if let Some(both) = self.inputs.iter().find(|c| self.outputs.contains(c)) {
            return Err(Error::Config(format!("column '{both}' is both an input and an output")));
        }
        if self.epochs == 0 || self.batch_size == 0 || self.decay_steps == 0 {
            return Err(Error::Config("epochs, batch_size and decay_steps must be positive".into()));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(Error::Config(format!(
                "train_fraction must lie in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if !(self.lr > 0.0) || !(self.decay_rate > 0.0) {
            return Err(Error::Config("lr and decay_rate must be positive".into()));
        }
        Ok(())
    }

    /// Final trained model.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join("model.json")
    }

    /// Weights written periodically during training.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.model_dir.join("checkpoint.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let hp = HParams::default();
        hp.validate().unwrap();
        assert_eq!(hp.inputs.len(), 5);
        assert_eq!(hp.outputs, vec!["Effect".to_string(), "Power".to_string()]);
        assert_eq!(hp.model_path(), PathBuf::from("data/orifice_weight/model.json"));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let hp: HParams = serde_json::from_str(r#"{ "epochs": 12, "lr": 0.01 }"#).unwrap();
        assert_eq!(hp.epochs, 12);
        assert_eq!(hp.lr, 0.01);
        assert_eq!(hp.decay_steps, 3000);
        assert_eq!(hp.random_state, 1);
    }

    #[test]
    fn unknown_input_column_is_rejected() {
        let hp = HParams { inputs: vec!["Pressure".into()], ..HParams::default() };
        assert!(matches!(hp.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn overlapping_input_and_output_is_rejected() {
        let mut hp = HParams::default();
        hp.inputs.push("Effect".into());
        assert!(hp.validate().is_err());
    }

    #[test]
    fn bad_train_fraction_is_rejected() {
        let hp = HParams { train_fraction: 1.0, ..HParams::default() };
        assert!(hp.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hparams.json");
        let hp = HParams { epochs: 7, ..HParams::default() };
        hp.save_json(&path).unwrap();
        assert_eq!(HParams::load_json(&path).unwrap(), hp);
    }
}
