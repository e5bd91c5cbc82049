use std::path::Path;

use log::info;
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::train::epoch_stats::History;

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Upper axis bound with some headroom; never zero.
fn upper_bound(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 { max * 1.05 } else { 1.0 }
}

/// Line chart of training loss and validation MSE per epoch.
pub fn plot_history<P: AsRef<Path>>(path: P, history: &History) -> Result<()> {
    if history.is_empty() {
        return Err(Error::Plot("history is empty".into()));
    }
    let path = path.as_ref();

    let train: Vec<(f64, f64)> = history.epochs.iter().map(|s| (s.epoch as f64, s.loss)).collect();
    let val: Vec<(f64, f64)> = history.epochs.iter()
        .filter_map(|s| s.val_mse.map(|v| (s.epoch as f64, v)))
        .collect();

    let y_max = train.iter().chain(&val).map(|&(_, y)| y).fold(0.0, f64::max);
    let x_max = history.len().max(2) as f64;

    let root = SVGBackend::new(path, (800, 1200)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Training history", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(1.0..x_max, 0.0..upper_bound(y_max))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("MeanSquareError [Effect^2]")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(train, &BLUE))
        .map_err(plot_err)?
        .label("Train Error")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    if !val.is_empty() {
        chart
            .draw_series(LineSeries::new(val, &RED))
            .map_err(plot_err)?
            .label("Val Error")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("wrote training history plot to {}", path.display());
    Ok(())
}

/// Scatter of true against predicted values with a `y = x` reference line
/// and the R² score in the corner. One colour per output column.
pub fn plot_r2<P: AsRef<Path>>(
    path: P,
    title: &str,
    outputs: &[String],
    truth: &[Vec<f64>],
    predictions: &[Vec<f64>],
    r2: f64,
) -> Result<()> {
    if truth.is_empty() || truth.len() != predictions.len() {
        return Err(Error::Plot(format!(
            "cannot plot {} targets against {} predictions",
            truth.len(),
            predictions.len()
        )));
    }
    let path = path.as_ref();

    let line_max = truth.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    let pred_max = predictions.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    let lim = upper_bound(line_max.max(pred_max));

    let root = SVGBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0.0..lim, 0.0..lim)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("True Values")
        .y_desc("Predictions")
        .draw()
        .map_err(plot_err)?;

    for (j, name) in outputs.iter().enumerate() {
        let color = Palette99::pick(j);
        let points: Vec<(f64, f64)> = truth.iter().zip(predictions)
            .map(|(t, p)| (t[j], p[j]))
            .collect();
        chart
            .draw_series(points.into_iter().map(|c| Circle::new(c, 3, color.filled())))
            .map_err(plot_err)?
            .label(name.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 4, Palette99::pick(j).filled()));
    }

    if line_max.is_finite() && line_max > 0.0 {
        chart
            .draw_series(LineSeries::new(vec![(0.0, 0.0), (line_max, line_max)], &BLACK))
            .map_err(plot_err)?;
    }

    chart
        .draw_series(std::iter::once(Text::new(
            format!("R-squared: {r2:1.4}"),
            (lim * 0.05, lim * 0.95),
            ("sans-serif", 20).into_font(),
        )))
        .map_err(plot_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("wrote R² plot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::epoch_stats::EpochStats;

    fn history(n: usize) -> History {
        let mut h = History::default();
        for epoch in 1..=n {
            h.push(EpochStats {
                epoch,
                total_epochs: n,
                loss: 1.0 / epoch as f64,
                mse: 1.0 / epoch as f64,
                mae: 0.5,
                val_loss: Some(1.2 / epoch as f64),
                val_mse: Some(1.2 / epoch as f64),
                val_mae: Some(0.6),
                learning_rate: 1e-4,
                elapsed_ms: 0,
            });
        }
        h
    }

    #[test]
    fn history_plot_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.svg");
        plot_history(&path, &history(10)).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Train Error"));
    }

    #[test]
    fn empty_history_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plot_history(dir.path().join("h.svg"), &History::default()).is_err());
    }

    #[test]
    fn r2_plot_writes_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r2.svg");
        let truth = vec![vec![10.0, 200.0], vec![20.0, 150.0], vec![30.0, 120.0]];
        let preds = vec![vec![11.0, 190.0], vec![19.0, 160.0], vec![29.0, 118.0]];
        let outputs = vec!["Effect".to_string(), "Power".to_string()];
        plot_r2(&path, "Test", &outputs, &truth, &preds, 0.9731).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("R-squared: 0.9731"));
    }
}
