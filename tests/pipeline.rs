use std::fmt::Write as _;
use std::path::Path;

use consequence_nn::{Algorithm, Error, HParams};

/// Effect and Power are linear in the five measurements.
fn write_dataset(path: &Path, rows: usize) {
    let mut text = String::from("Orifice diameter,Time 1,PPM 1,Time 2,PPM 2,Effect,Power\n");
    for i in 0..rows {
        let d = 1.0 + (i % 5) as f64;
        let t1 = ((i * 7) % 11) as f64;
        let ppm1 = 100.0 + ((i * 13) % 17) as f64 * 10.0;
        let t2 = ((i * 3) % 7) as f64;
        let ppm2 = 50.0 + ((i * 5) % 9) as f64 * 5.0;
        let effect = 3.0 * d + 0.5 * t1 + 0.01 * ppm1;
        let power = 2.0 * t2 + 0.02 * ppm2 + d;
        writeln!(text, "{d}, {t1}, {ppm1}, {t2}, {ppm2}, {effect}, {power}").unwrap();
    }
    // A row with a missing reading and a comment line; both are ignored.
    text.push_str("2,?,120,3,60,1,1\n\tcalibration run\n");
    std::fs::write(path, text).unwrap();
}

fn hparams(root: &Path) -> HParams {
    HParams {
        data_path: root.join("consequence.csv"),
        model_dir: root.join("model"),
        log_dir: root.join("logs"),
        result_path: root.join("results").join("test.csv"),
        plot_dir: root.join("plots"),
        epochs: 60,
        batch_size: 1,
        lr: 0.01,
        decay_steps: 1000,
        save_freq: 500,
        histogram_freq: 20,
        ..HParams::default()
    }
}

#[test]
fn train_then_test_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let hp = hparams(dir.path());
    write_dataset(&hp.data_path, 60);

    let algorithm = Algorithm::new(hp.clone()).unwrap();
    let report = algorithm.train_run(false).unwrap();

    assert_eq!(report.history.len(), 60);
    assert!(report.model_path.exists());
    assert!(hp.checkpoint_path().exists());
    assert!(report.run_dir.join("epochs.jsonl").exists());
    assert!(report.run_dir.join("weights.jsonl").exists());
    assert!(report.run_dir.join("history.json").exists());
    assert!(hp.plot_dir.join("history.svg").exists());

    let first = report.history.epochs[0].loss;
    let last = report.history.last().unwrap().loss;
    assert!(last < first, "training loss did not fall: {first} -> {last}");

    let test = algorithm.test_run().unwrap();
    assert!(test.train_r2 > 0.7, "train r2 {}", test.train_r2);
    assert!(test.test_r2.is_finite());
    assert!(test.train.mse < 0.05, "train mse {}", test.train.mse);
    assert!(hp.plot_dir.join("r2_train.svg").exists());
    assert!(hp.plot_dir.join("r2_test.svg").exists());

    let results = std::fs::read_to_string(&test.result_path).unwrap();
    let mut lines = results.lines();
    assert_eq!(lines.next(), Some("Effect,Power,Pred_Effect,Pred_Power"));
    // 15% of the 60 complete rows.
    assert_eq!(lines.count(), 9);
}

#[test]
fn transfer_continues_from_saved_model() {
    let dir = tempfile::tempdir().unwrap();
    let hp = HParams { epochs: 3, ..hparams(dir.path()) };
    write_dataset(&hp.data_path, 40);

    let algorithm = Algorithm::new(hp.clone()).unwrap();
    assert!(matches!(algorithm.train_run(true), Err(Error::Data(_))));

    algorithm.train_run(false).unwrap();
    let resumed = algorithm.train_run(true).unwrap();
    assert_eq!(resumed.history.len(), 3);

    let narrower = HParams {
        outputs: vec!["Effect".to_string()],
        ..hp
    };
    let other = Algorithm::new(narrower).unwrap();
    assert!(matches!(other.train_run(true), Err(Error::Shape(_))));
    assert!(matches!(other.test_run(), Err(Error::Shape(_))));
}

#[test]
fn transfer_falls_back_to_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let hp = HParams { epochs: 3, save_freq: 10, ..hparams(dir.path()) };
    write_dataset(&hp.data_path, 40);

    let algorithm = Algorithm::new(hp.clone()).unwrap();
    algorithm.train_run(false).unwrap();
    assert!(hp.checkpoint_path().exists());
    std::fs::remove_file(hp.model_path()).unwrap();

    let resumed = algorithm.train_run(true).unwrap();
    assert_eq!(resumed.history.len(), 3);
    assert!(hp.model_path().exists());
    algorithm.test_run().unwrap();
}

#[test]
fn test_run_without_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let hp = hparams(dir.path());
    write_dataset(&hp.data_path, 20);
    let algorithm = Algorithm::new(hp).unwrap();
    assert!(matches!(algorithm.test_run(), Err(Error::Data(_))));
}
