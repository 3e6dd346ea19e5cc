//! Forecast, evaluation and residual charts.

use crate::config::ForecastConfig;
use crate::diagnostics::ResidualDiagnostics;
use crate::evaluation::EvaluationResult;
use crate::forecaster::StoreForecast;
use chrono::NaiveDate;
use sales_processing::charts::{
    self, BLUE, Band, ChartSettings, GREEN, Line, ORANGE, RED, XAxis, day_offset,
};
use sales_processing::{
    ChartFailure, ChartOutcome, ProcessingError, ProcessingResult, StoreId, WeeklySeries,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const EVALUATION_PLOT: &str = "Actual vs Forecasted Sales_plot.png";
pub const RESIDUALS_PLOT: &str = "Residuals_plot.png";

pub fn store_chart_name(store: StoreId) -> String {
    format!("store_{}_sales_forecast.png", store)
}

/// Writes charts into the output directory and records what happened.
///
/// A chart that fails is logged and recorded; it never fails the caller.
#[derive(Debug, Clone)]
pub struct ChartWriter {
    output_dir: PathBuf,
    size: (u32, u32),
    enabled: bool,
}

impl ChartWriter {
    pub fn new(config: &ForecastConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: config.chart_size,
            enabled: config.generate_charts,
        }
    }

    pub fn write<F>(&self, outcome: &mut ChartOutcome, file_name: &str, draw: F)
    where
        F: FnOnce(&Path, (u32, u32)) -> ProcessingResult<()>,
    {
        if !self.enabled {
            return;
        }
        let path = self.output_dir.join(file_name);
        let result = fs::create_dir_all(&self.output_dir)
            .map_err(ProcessingError::from)
            .and_then(|()| draw(&path, self.size));
        match result {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                outcome.written.push(file_name.to_string());
            }
            Err(e) => {
                warn!("Could not render {}: {}", file_name, e);
                outcome.failed.push(ChartFailure {
                    chart: file_name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Observed weekly sales, the forecast and its shaded interval.
pub fn store_forecast_chart(
    path: &Path,
    size: (u32, u32),
    series: &WeeklySeries,
    forecast: &StoreForecast,
) -> ProcessingResult<()> {
    let origin = series
        .dates
        .first()
        .copied()
        .ok_or_else(|| ProcessingError::NoValidValues("Date".to_string()))?;
    let x = |d: &NaiveDate| day_offset(origin, *d);

    let observed = series.dates.iter().map(x).zip(series.values.iter().copied()).collect();
    let predicted = forecast
        .dates
        .iter()
        .map(x)
        .zip(forecast.forecast.mean.iter().copied())
        .collect();
    let band = Band {
        name: format!("{:.0}% CI", forecast.forecast.confidence * 100.0),
        points: forecast
            .dates
            .iter()
            .zip(forecast.forecast.lower.iter().zip(&forecast.forecast.upper))
            .map(|(d, (lo, hi))| (x(d), *lo, *hi))
            .collect(),
        color: ORANGE,
    };

    charts::line_chart(
        path,
        &ChartSettings::new(format!("Sales Forecast for Store {}", forecast.store))
            .labels("Date", "Weekly Sales")
            .size(size),
        &XAxis::Days { origin },
        &[
            Line::new("Observed", observed, BLUE),
            Line::new("Forecast", predicted, RED),
        ],
        Some(&band),
    )
}

/// Training data, held-out actuals and the holdout forecast.
///
/// With `dates` the x axis shows dates; otherwise observation indices.
pub fn evaluation_chart(
    path: &Path,
    size: (u32, u32),
    train: &[f64],
    result: &EvaluationResult,
    dates: Option<&[NaiveDate]>,
) -> ProcessingResult<()> {
    let (axis, xs): (XAxis, Vec<f64>) = match dates.and_then(|d| d.first().map(|o| (d, *o))) {
        Some((dates, origin)) => (
            XAxis::Days { origin },
            dates.iter().map(|d| day_offset(origin, *d)).collect(),
        ),
        None => {
            let n = train.len() + result.actual.len();
            (XAxis::Numeric, (0..n).map(|i| i as f64).collect())
        }
    };
    if xs.len() < train.len() + result.actual.len() {
        return Err(ProcessingError::ChartFailed(
            "fewer dates than observations".to_string(),
        ));
    }

    let test_xs = &xs[train.len()..];
    let train_line = Line::new(
        "Train",
        xs.iter().copied().zip(train.iter().copied()).collect(),
        BLUE,
    );
    let actual_line = Line::new(
        "Actual",
        test_xs.iter().copied().zip(result.actual.iter().copied()).collect(),
        GREEN,
    );
    let forecast_line = Line::new(
        "Forecast",
        test_xs
            .iter()
            .copied()
            .zip(result.forecast.mean.iter().copied())
            .collect(),
        RED,
    );
    let band = Band {
        name: format!("{:.0}% CI", result.forecast.confidence * 100.0),
        points: test_xs
            .iter()
            .zip(result.forecast.lower.iter().zip(&result.forecast.upper))
            .map(|(x, (lo, hi))| (*x, *lo, *hi))
            .collect(),
        color: ORANGE,
    };

    charts::line_chart(
        path,
        &ChartSettings::new("Actual vs Forecasted Sales")
            .labels(if dates.is_some() { "Date" } else { "Observation" }, "Weekly Sales")
            .size(size),
        &axis,
        &[train_line, actual_line, forecast_line],
        Some(&band),
    )
}

/// Residuals on top, their autocorrelation with the 95% band below.
pub fn residual_chart(
    path: &Path,
    size: (u32, u32),
    diagnostics: &ResidualDiagnostics,
) -> ProcessingResult<()> {
    charts::line_and_stems(
        path,
        &ChartSettings::new("Residuals").size(size),
        "Autocorrelation of Residuals",
        &diagnostics.residuals,
        &diagnostics.acf,
        diagnostics.confidence_band,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_chart_name() {
        assert_eq!(store_chart_name(7), "store_7_sales_forecast.png");
    }

    #[test]
    fn test_disabled_writer_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForecastConfig::builder().generate_charts(false).build().unwrap();
        let writer = ChartWriter::new(&config, dir.path());
        let mut outcome = ChartOutcome::default();
        writer.write(&mut outcome, "never.png", |_, _| {
            panic!("drawing should not run when charts are disabled")
        });
        assert!(outcome.written.is_empty() && outcome.failed.is_empty());
    }

    #[test]
    fn test_failed_chart_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ChartWriter::new(&ForecastConfig::default(), dir.path());
        let mut outcome = ChartOutcome::default();
        writer.write(&mut outcome, "broken.png", |_, _| {
            Err(ProcessingError::ChartFailed("no backend".to_string()))
        });
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].chart, "broken.png");
        assert!(outcome.written.is_empty());
    }
}
