//! The end-to-end experiment: load, split, train, save, reload, evaluate,
//! denormalize, plot and write results.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::config::HParams;
use crate::data::dataset::Dataset;
use crate::data::split::SplitData;
use crate::data::stats::ColumnStats;
use crate::error::{Error, Result};
use crate::eval::metrics::{evaluate, r2_score, Evaluation};
use crate::eval::report::{write_results, Predictions};
use crate::network::artifact::ModelArtifact;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::optim::adam::Adam;
use crate::optim::schedule::ExponentialDecay;
use crate::plot::charts::{plot_history, plot_r2};
use crate::train::callbacks::{ModelCheckpoint, RunLogger, TrainCallback};
use crate::train::epoch_stats::History;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// Outcome of `Algorithm::train_run`.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history: History,
    pub model_path: PathBuf,
    pub run_dir: PathBuf,
}

/// Outcome of `Algorithm::test_run`.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub train: Evaluation,
    pub test: Evaluation,
    pub train_r2: f64,
    pub test_r2: f64,
    pub result_path: PathBuf,
}

pub struct Algorithm {
    hparams: HParams,
    dataset: Dataset,
    stats: ColumnStats,
}

impl Algorithm {
    /// Loads the dataset named in `hparams`.
    pub fn new(hparams: HParams) -> Result<Algorithm> {
        hparams.validate()?;
        let dataset = Dataset::from_csv(&hparams.data_path, &hparams.columns)?;
        Algorithm::with_dataset(hparams, dataset)
    }

    pub fn with_dataset(hparams: HParams, dataset: Dataset) -> Result<Algorithm> {
        hparams.validate()?;
        if dataset.column_names() != hparams.columns.as_slice() {
            return Err(Error::Config(format!(
                "dataset columns {:?} do not match configured columns {:?}",
                dataset.column_names(),
                hparams.columns
            )));
        }
        let stats = ColumnStats::from_dataset(&dataset)?;
        info!("dataset: {} rows, {} columns", dataset.len(), dataset.column_names().len());
        Ok(Algorithm { hparams, dataset, stats })
    }

    pub fn hparams(&self) -> &HParams {
        &self.hparams
    }

    fn split(&self, stats: &ColumnStats) -> Result<SplitData> {
        let hp = &self.hparams;
        let split = SplitData::new(
            &self.dataset,
            stats,
            &hp.inputs,
            &hp.outputs,
            hp.train_fraction,
            hp.random_state,
        )?;
        info!("split: {} train / {} test rows", split.train.len(), split.test.len());
        Ok(split)
    }

    /// Trains a fresh network, or continues from the saved weights when
    /// `transfer` is set, then saves the model and the training curves.
    pub fn train_run(&self, transfer: bool) -> Result<TrainReport> {
        let hp = &self.hparams;
        let split = self.split(&self.stats)?;

        let spec = NetworkSpec::dense_regressor(hp.inputs.len(), hp.outputs.len());
        let mut network = if transfer {
            self.load_transfer_weights()?
        } else {
            Network::from_spec(&spec, &mut StdRng::seed_from_u64(hp.random_state))
        };

        fs::create_dir_all(&hp.model_dir)?;
        let mut optimizer = Adam::new(ExponentialDecay::new(hp.lr, hp.decay_steps, hp.decay_rate, true));
        let mut checkpoint = ModelCheckpoint::new(hp.checkpoint_path(), hp.save_freq);
        let mut run_logger = RunLogger::create(&hp.log_dir, hp.histogram_freq)?;
        let run_dir = run_logger.run_dir().to_path_buf();
        let config = TrainConfig::new(hp.epochs, hp.batch_size).with_seed(hp.random_state);

        let history = {
            let mut callbacks: [&mut dyn TrainCallback; 2] = [&mut checkpoint, &mut run_logger];
            train_loop(
                &mut network,
                &mut optimizer,
                &split.train.inputs,
                &split.train.targets,
                Some(split.test.inputs.as_slice()),
                Some(split.test.targets.as_slice()),
                &config,
                &mut callbacks,
            )?
        };

        let model_path = hp.model_path();
        let artifact = ModelArtifact::new(
            spec,
            network,
            hp.inputs.clone(),
            hp.outputs.clone(),
            self.stats.clone(),
        );
        artifact.save_json(&model_path)?;
        info!("saved model to {}", model_path.display());

        history.save_json(run_dir.join("history.json"))?;
        fs::create_dir_all(&hp.plot_dir)?;
        plot_history(hp.plot_dir.join("history.svg"), &history)?;

        Ok(TrainReport { history, model_path, run_dir })
    }

    /// Reloads the saved model, evaluates both splits and writes the test
    /// predictions next to the true values.
    pub fn test_run(&self) -> Result<TestReport> {
        let hp = &self.hparams;
        let model_path = hp.model_path();
        let artifact = ModelArtifact::load_json(&model_path).map_err(|e| {
            Error::Data(format!("cannot load model {}: {}", model_path.display(), e))
        })?;
        artifact.ensure_columns(&hp.inputs, &hp.outputs)?;
        if artifact.stats != self.stats {
            warn!("dataset statistics differ from the ones stored with the model; using the stored ones");
        }

        let split = self.split(&artifact.stats)?;
        let network = &artifact.network;

        let train_eval = evaluate(network, &split.train.inputs, &split.train.targets);
        let test_eval = evaluate(network, &split.test.inputs, &split.test.targets);
        info!("training set mean error: {:5.4}", train_eval.mean());
        info!("test set mean error: {:5.4}", test_eval.mean());

        let train_pred = Predictions::denormalized(network, &split.train.inputs, &artifact.stats, &hp.outputs)?;
        let test_pred = Predictions::denormalized(network, &split.test.inputs, &artifact.stats, &hp.outputs)?;

        let train_r2 = r2_score(&split.train.raw_targets, &train_pred.rows);
        let test_r2 = r2_score(&split.test.raw_targets, &test_pred.rows);
        info!("train r2_score: {train_r2}");
        info!("test r2_score: {test_r2}");

        fs::create_dir_all(&hp.plot_dir)?;
        plot_r2(hp.plot_dir.join("r2_train.svg"), "Train", &hp.outputs, &split.train.raw_targets, &train_pred.rows, train_r2)?;
        plot_r2(hp.plot_dir.join("r2_test.svg"), "Test", &hp.outputs, &split.test.raw_targets, &test_pred.rows, test_r2)?;

        write_results(&hp.result_path, &hp.outputs, &split.test.raw_targets, &test_pred)?;
        info!("wrote test results to {}", hp.result_path.display());

        Ok(TestReport {
            train: train_eval,
            test: test_eval,
            train_r2,
            test_r2,
            result_path: hp.result_path.clone(),
        })
    }

    /// Weights to continue from: the saved model if present, else the last
    /// checkpoint.
    fn load_transfer_weights(&self) -> Result<Network> {
        let hp = &self.hparams;
        let model_path = hp.model_path();
        let checkpoint_path = hp.checkpoint_path();

        let network = if model_path.exists() {
            let artifact = ModelArtifact::load_json(&model_path)?;
            artifact.ensure_columns(&hp.inputs, &hp.outputs)?;
            info!("continuing from {}", model_path.display());
            artifact.network
        } else if checkpoint_path.exists() {
            info!("continuing from checkpoint {}", checkpoint_path.display());
            Network::load_json(&checkpoint_path)?
        } else {
            return Err(Error::Data(format!(
                "no saved weights in {} to continue from",
                hp.model_dir.display()
            )));
        };

        if network.input_size() != hp.inputs.len() || network.output_size() != hp.outputs.len() {
            return Err(Error::Shape(format!(
                "saved network maps {} -> {} values, configuration needs {} -> {}",
                network.input_size(),
                network.output_size(),
                hp.inputs.len(),
                hp.outputs.len()
            )));
        }
        Ok(network)
    }
}
