//! Holdout evaluation: refit on all but the last weeks and score the forecast.

use crate::config::{EvaluationSeries, ForecastConfig};
use crate::error::{ForecastError, Result};
use crate::metrics::AccuracyMetrics;
use crate::model::{FittedSarima, ForecastOutput, ModelSummary, Sarima};
use crate::plots::{self, ChartWriter};
use chrono::NaiveDate;
use sales_processing::{ChartOutcome, WeeklySeries, chain_total_series, stacked_series};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// The series an evaluation runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationInput {
    pub kind: EvaluationSeries,
    pub values: Vec<f64>,
    /// Dates aligned with `values`; `None` for the stacked series, whose
    /// index restarts with every store.
    pub dates: Option<Vec<NaiveDate>>,
}

impl EvaluationInput {
    pub fn from_weekly(kind: EvaluationSeries, series: &[WeeklySeries]) -> Self {
        match kind {
            EvaluationSeries::Stacked => Self {
                kind,
                values: stacked_series(series),
                dates: None,
            },
            EvaluationSeries::ChainTotal => {
                let (dates, values) = chain_total_series(series);
                Self {
                    kind,
                    values,
                    dates: Some(dates),
                }
            }
        }
    }
}

/// Scores of the holdout forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub series: EvaluationSeries,
    pub train_len: usize,
    pub test_len: usize,
    pub actual: Vec<f64>,
    pub forecast: ForecastOutput,
    pub metrics: AccuracyMetrics,
    pub model: ModelSummary,
}

/// An evaluation together with the fitted model and its training data.
#[derive(Debug, Clone)]
pub struct HoldoutRun {
    pub result: EvaluationResult,
    pub fit: FittedSarima,
    pub train: Vec<f64>,
    pub charts: ChartOutcome,
}

/// Splits off the last `holdout` observations, refits and compares.
pub struct HoldoutEvaluator {
    config: ForecastConfig,
    charts: ChartWriter,
}

impl HoldoutEvaluator {
    pub fn new(config: ForecastConfig, output_dir: impl Into<PathBuf>) -> Self {
        let charts = ChartWriter::new(&config, output_dir);
        Self { config, charts }
    }

    pub fn evaluate(&self, input: &EvaluationInput) -> Result<HoldoutRun> {
        let holdout = self.config.holdout;
        let n = input.values.len();
        if n <= holdout {
            return Err(ForecastError::InsufficientData {
                required: holdout + 1,
                actual: n,
            });
        }

        let (train, test) = input.values.split_at(n - holdout);
        info!(
            "Evaluating on the {} series: {} training and {} test observations",
            input.kind.as_str(),
            train.len(),
            test.len()
        );

        let fit = Sarima::from_config(&self.config, self.config.enforce_evaluation_constraints)
            .fit(train)?;
        let forecast = fit.forecast(holdout, self.config.confidence)?;
        let metrics = AccuracyMetrics::compute(test, &forecast.mean)?;
        log_metrics(&metrics);

        let result = EvaluationResult {
            series: input.kind,
            train_len: train.len(),
            test_len: test.len(),
            actual: test.to_vec(),
            forecast,
            metrics,
            model: fit.summary(),
        };

        let mut charts = ChartOutcome::default();
        self.charts.write(&mut charts, plots::EVALUATION_PLOT, |path, size| {
            plots::evaluation_chart(path, size, train, &result, input.dates.as_deref())
        });

        Ok(HoldoutRun {
            result,
            fit,
            train: train.to_vec(),
            charts,
        })
    }
}

fn log_metrics(metrics: &AccuracyMetrics) {
    info!("Mean Absolute Error (MAE): {:.2}", metrics.mae);
    info!("Mean Squared Error (MSE): {:.2}", metrics.mse);
    info!("Root Mean Squared Error (RMSE): {:.2}", metrics.rmse);
    match metrics.mape {
        Some(mape) => info!("Mean Absolute Percentage Error (MAPE): {:.2}%", mape),
        None => info!("MAPE undefined: every actual value is zero"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SarimaOrder, SeasonalOrder};
    use chrono::Duration;

    fn config(holdout: usize) -> ForecastConfig {
        ForecastConfig::builder()
            .order(SarimaOrder::new(1, 1, 1))
            .seasonal(SeasonalOrder::none())
            .holdout(holdout)
            .generate_charts(false)
            .build()
            .unwrap()
    }

    fn weekly(store: i64, offset: f64) -> WeeklySeries {
        let start = NaiveDate::from_ymd_opt(2011, 1, 2).unwrap();
        WeeklySeries {
            store,
            dates: (0..40).map(|i| start + Duration::weeks(i)).collect(),
            values: (0..40).map(|i| offset + 3.0 * i as f64 + (i % 4) as f64).collect(),
        }
    }

    #[test]
    fn test_input_selection() {
        let series = [weekly(1, 100.0), weekly(2, 500.0)];

        let stacked = EvaluationInput::from_weekly(EvaluationSeries::Stacked, &series);
        assert_eq!(stacked.values.len(), 80);
        assert!(stacked.dates.is_none());

        let total = EvaluationInput::from_weekly(EvaluationSeries::ChainTotal, &series);
        assert_eq!(total.values.len(), 40);
        assert_eq!(total.values[0], 600.0);
        assert_eq!(total.dates.as_ref().map(|d| d.len()), Some(40));
    }

    #[test]
    fn test_holdout_split_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let input = EvaluationInput::from_weekly(EvaluationSeries::ChainTotal, &[weekly(1, 100.0)]);
        let run = HoldoutEvaluator::new(config(8), dir.path()).evaluate(&input).unwrap();

        assert_eq!(run.result.train_len, 32);
        assert_eq!(run.result.test_len, 8);
        assert_eq!(run.result.forecast.len(), 8);
        assert_eq!(run.train.len(), 32);
        assert!(run.result.model.enforce_constraints);

        let m = run.result.metrics;
        assert!(m.mae >= 0.0 && m.mse >= 0.0 && m.rmse >= 0.0);
        assert_eq!(m.rmse, m.mse.sqrt());
    }

    #[test]
    fn test_series_shorter_than_holdout() {
        let dir = tempfile::tempdir().unwrap();
        let input = EvaluationInput {
            kind: EvaluationSeries::Stacked,
            values: vec![1.0; 12],
            dates: None,
        };
        let err = HoldoutEvaluator::new(config(12), dir.path())
            .evaluate(&input)
            .unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }
}
