//! Percentile-band grid plots
//!
//! Renders a persisted statistics log as one bitmap: a grid with one row per
//! layer and one column per statistic category (weights, biases, weight
//! gradients, bias gradients). Each cell shows the min/max envelope, the
//! three symmetric percentile bands, and the median line, all over the
//! reporting-trigger axis.
//!
//! Plot keys are resolved against the exact strings the monitor wrote; a key
//! the log never carried is a configuration error, reported by name instead
//! of silently rendering an empty series.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::report::LogSeries;
use crate::source::{ParamAttr, ParamName};
use crate::stats::{key, SIGMA_PERCENTILES};
use crate::{Error, Result};

/// Column order of the grid: parameter/attribute per category.
pub const CATEGORIES: [(ParamName, ParamAttr); 4] = [
    (ParamName::Weight, ParamAttr::Data),
    (ParamName::Bias, ParamAttr::Data),
    (ParamName::Weight, ParamAttr::Grad),
    (ParamName::Bias, ParamAttr::Grad),
];

/// Column captions, aligned with [`CATEGORIES`].
pub const CATEGORY_LABELS: [&str; 4] =
    ["Weights", "Biases", "Weight Gradients", "Bias Gradients"];

/// What to render from a log.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    /// Grid rows, one per layer, in order.
    pub layers: Vec<String>,
    /// Scope prefix the monitor wrote keys under, e.g. `predictor`.
    pub scope: Option<String>,
    /// Pixel size of one grid cell (square).
    pub cell_size: u32,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self { layers: Vec::new(), scope: None, cell_size: 512 }
    }
}

/// Render the full grid to a bitmap image.
///
/// # Errors
///
/// [`Error::MissingKey`] when a required series is absent from the log,
/// [`Error::Config`] when the spec names no layers, [`Error::Plot`] on
/// rendering failures.
pub fn render_grid(log: &LogSeries, spec: &PlotSpec, out: impl AsRef<Path>) -> Result<()> {
    if spec.layers.is_empty() {
        return Err(Error::Config("plot spec names no layers".to_string()));
    }

    let n_rows = spec.layers.len();
    let n_cols = CATEGORIES.len();
    let width = spec.cell_size * n_cols as u32;
    let height = spec.cell_size * n_rows as u32;

    let root = BitMapBackend::new(out.as_ref(), (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let cells = root.split_evenly((n_rows, n_cols));

    for (row, layer) in spec.layers.iter().enumerate() {
        for (col, (param, attr)) in CATEGORIES.iter().enumerate() {
            let cell = CellSeries::resolve(log, spec.scope.as_deref(), layer, *param, *attr)?;
            draw_cell(&cells[row * n_cols + col], layer, CATEGORY_LABELS[col], &cell)?;
        }
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// The per-trigger series one cell draws from.
#[derive(Debug)]
struct CellSeries<'a> {
    min: &'a [f64],
    max: &'a [f64],
    percentiles: Vec<&'a [f64]>,
}

impl<'a> CellSeries<'a> {
    fn resolve(
        log: &'a LogSeries,
        scope: Option<&str>,
        layer: &str,
        param: ParamName,
        attr: ParamAttr,
    ) -> Result<Self> {
        let scoped = |k: String| match scope {
            Some(prefix) => key::prefixed(prefix, &k),
            None => k,
        };

        let series = |k: String| -> Result<&'a [f64]> {
            log.get(&k).map(Vec::as_slice).ok_or_else(|| Error::MissingKey(k))
        };

        let min = series(scoped(key::statistic_key(layer, param, attr, "min")))?;
        let max = series(scoped(key::statistic_key(layer, param, attr, "max")))?;
        let percentiles = (0..SIGMA_PERCENTILES.len())
            .map(|i| series(scoped(key::percentile_key(layer, param, attr, i))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { min, max, percentiles })
    }

    /// Value range across every series, ignoring NaN samples.
    fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.min.iter().chain(self.max.iter()).copied() {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        if lo > hi {
            // Nothing finite recorded yet
            return (-1.0, 1.0);
        }
        if lo == hi {
            return (lo - 0.5, hi + 0.5);
        }
        (lo, hi)
    }
}

fn draw_cell<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    layer: &str,
    label: &str,
    cell: &CellSeries<'_>,
) -> Result<()> {
    let (y_min, y_max) = cell.value_range();
    let x_max = (cell.min.len().saturating_sub(1)).max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(layer, ("sans-serif", 22))
        .margin(8)
        .x_label_area_size(32)
        .y_label_area_size(48)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Epochs")
        .y_desc(label)
        .draw()
        .map_err(plot_err)?;

    let band_style = GREEN.mix(0.2).filled();

    // Min/max envelope
    draw_band(&mut chart, cell.min, cell.max, band_style)?;

    // Symmetric sigma bands: 0-6, 1-5, 2-4
    let n = cell.percentiles.len();
    for p in 0..n / 2 {
        draw_band(&mut chart, cell.percentiles[p], cell.percentiles[n - 1 - p], band_style)?;
    }

    // Median line
    let median: Vec<(f64, f64)> = finite_points(cell.percentiles[n / 2]);
    chart.draw_series(LineSeries::new(median, GREEN.mix(0.8))).map_err(plot_err)?;

    Ok(())
}

fn draw_band<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    lower: &[f64],
    upper: &[f64],
    style: ShapeStyle,
) -> Result<()> {
    let points = band_points(lower, upper);
    if points.len() < 3 {
        return Ok(());
    }
    chart.draw_series(std::iter::once(Polygon::new(points, style))).map_err(plot_err)?;
    Ok(())
}

/// Polygon outline of a filled band: the upper bound walked forward, then the
/// lower bound walked back. Samples where either bound is NaN (uninitialized
/// epochs) are skipped.
fn band_points(lower: &[f64], upper: &[f64]) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for (i, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
        if lo.is_finite() && hi.is_finite() {
            points.push((i as f64, *hi));
        }
    }
    for (i, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate().rev() {
        if lo.is_finite() && hi.is_finite() {
            points.push((i as f64, *lo));
        }
    }
    points
}

fn finite_points(series: &[f64]) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

fn plot_err(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{LayerMonitor, MonitorConfig};
    use crate::source::{InMemorySource, ParamEntry, ParamTensor};
    use ndarray::Array1;

    #[test]
    fn test_band_points_walk_forward_then_back() {
        let lower = [1.0, 2.0, 3.0];
        let upper = [4.0, 5.0, 6.0];
        let points = band_points(&lower, &upper);
        assert_eq!(
            points,
            vec![(0.0, 4.0), (1.0, 5.0), (2.0, 6.0), (2.0, 3.0), (1.0, 2.0), (0.0, 1.0)]
        );
    }

    #[test]
    fn test_band_points_skip_nan_samples() {
        let lower = [1.0, f64::NAN, 3.0];
        let upper = [4.0, 5.0, 6.0];
        let points = band_points(&lower, &upper);
        assert_eq!(points, vec![(0.0, 4.0), (2.0, 6.0), (2.0, 3.0), (0.0, 1.0)]);
    }

    #[test]
    fn test_finite_points_filters_nan() {
        let points = finite_points(&[1.0, f64::NAN, 3.0]);
        assert_eq!(points, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_cell_series_missing_key_is_reported_by_name() {
        let log = LogSeries::new();
        let err = CellSeries::resolve(&log, Some("predictor"), "conv1", ParamName::Weight, ParamAttr::Data)
            .expect_err("must fail");
        assert!(
            matches!(err, Error::MissingKey(ref k) if k == "predictor/conv1/W/data/min"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_value_range_handles_all_nan_and_flat_series() {
        let nan = vec![f64::NAN; 3];
        let cell = CellSeries { min: &nan[..], max: &nan[..], percentiles: vec![&nan[..]] };
        assert_eq!(cell.value_range(), (-1.0, 1.0));

        let flat = vec![2.0; 3];
        let cell = CellSeries { min: &flat[..], max: &flat[..], percentiles: vec![&flat[..]] };
        assert_eq!(cell.value_range(), (1.5, 2.5));
    }

    #[test]
    fn test_render_grid_requires_layers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = render_grid(&LogSeries::new(), &PlotSpec::default(), dir.path().join("p.png"))
            .expect_err("must fail");
        assert!(matches!(err, Error::Config(_)));
    }

    /// Full pipeline smoke test: monitor a source twice, plot the log.
    #[test]
    fn test_render_grid_from_monitored_log() {
        let mut source = InMemorySource::new();
        for layer in ["conv1", "conv2"] {
            source.push(
                ParamEntry::new(
                    layer,
                    ParamName::Weight,
                    ParamTensor::host(Array1::from_vec(vec![0.0_f32, 1.0, -1.0, 0.5]).into_dyn()),
                )
                .with_grad(ParamTensor::host(Array1::from_vec(vec![0.1_f32; 4]).into_dyn())),
            );
            source.push(
                ParamEntry::new(
                    layer,
                    ParamName::Bias,
                    ParamTensor::host(Array1::from_vec(vec![0.2_f32, -0.2]).into_dyn()),
                )
                .with_grad(ParamTensor::host(Array1::from_vec(vec![0.0_f32, 0.0]).into_dyn())),
            );
        }

        let monitor = LayerMonitor::new(MonitorConfig::default());
        let mut log = LogSeries::new();
        for _ in 0..3 {
            let record = monitor.observe(&source).expect("observe");
            for (k, v) in record {
                log.entry(k).or_default().push(v);
            }
        }

        let spec = PlotSpec {
            layers: vec!["conv1".to_string(), "conv2".to_string()],
            scope: None,
            cell_size: 128,
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("grid.png");
        render_grid(&log, &spec, &out).expect("render");
        assert!(out.exists());
    }
}
