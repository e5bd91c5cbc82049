//! consequence-nn
//!
//! Trains the orifice consequence regressor and evaluates it.
//!
//! Run with:
//!   cargo run --release -- run
//!   cargo run --release -- --config hparams.json train --transfer
//!   cargo run --release -- test

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use consequence_nn::{Algorithm, HParams};

#[derive(Parser, Debug)]
#[command(name = "consequence-nn", version, about = "Train and evaluate the orifice consequence regressor")]
struct Cli {
    /// Hyperparameter file (JSON); built-in defaults are used when omitted
    #[arg(long, short = 'c', global = true, env = "CONSEQUENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of training epochs
    #[arg(long, global = true)]
    epochs: Option<usize>,

    /// Override the random seed used for the split, initialization and shuffling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Override the dataset path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Override the model directory
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the network and save it
    Train {
        /// Continue from the weights saved in the model directory
        #[arg(long)]
        transfer: bool,
    },
    /// Evaluate the saved model and write predictions
    Test,
    /// Train, then test
    Run {
        #[arg(long)]
        transfer: bool,
    },
    /// Write the default hyperparameters to a JSON file
    InitConfig {
        path: PathBuf,
    },
}

impl Cli {
    fn hparams(&self) -> Result<HParams> {
        let mut hp = match &self.config {
            Some(path) => HParams::load_json(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => HParams::default(),
        };
        if let Some(epochs) = self.epochs {
            hp.epochs = epochs;
        }
        if let Some(seed) = self.seed {
            hp.random_state = seed;
        }
        if let Some(data) = &self.data {
            hp.data_path = data.clone();
        }
        if let Some(dir) = &self.model_dir {
            hp.model_dir = dir.clone();
        }
        hp.validate().context("invalid hyperparameters")?;
        Ok(hp)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let load = || -> Result<Algorithm> {
        let hparams = cli.hparams()?;
        Algorithm::new(hparams).context("loading dataset")
    };

    match &cli.command {
        Command::InitConfig { path } => {
            HParams::default()
                .save_json(path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("wrote default hyperparameters to {}", path.display());
        }
        Command::Train { transfer } => {
            load()?.train_run(*transfer).context("training failed")?;
        }
        Command::Test => {
            load()?.test_run().context("testing failed")?;
        }
        Command::Run { transfer } => {
            let algorithm = load()?;
            let report = algorithm.train_run(*transfer).context("training failed")?;
            info!("trained {} epochs, run log in {}", report.history.len(), report.run_dir.display());
            algorithm.test_run().context("testing failed")?;
        }
    }

    Ok(())
}
