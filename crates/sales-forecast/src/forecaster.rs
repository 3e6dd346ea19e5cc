//! Per-store forecasting: one independent model per weekly store series.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::model::{ForecastOutput, ModelSummary, Sarima};
use crate::plots::{self, ChartWriter};
use crate::progress::{ProgressReporter, ProgressUpdate};
use chrono::{Duration, NaiveDate};
use sales_processing::{ChartOutcome, StoreId, WeeklySeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Forecast for one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreForecast {
    pub store: StoreId,
    /// Week-ending dates of the forecast periods.
    pub dates: Vec<NaiveDate>,
    #[serde(flatten)]
    pub forecast: ForecastOutput,
    pub model: ModelSummary,
    pub history_weeks: usize,
}

/// A store whose model could not be fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreFailure {
    pub store: StoreId,
    pub code: String,
    pub message: String,
}

/// Results of forecasting every store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastBatch {
    pub forecasts: BTreeMap<StoreId, StoreForecast>,
    pub skipped: Vec<StoreFailure>,
    pub charts: ChartOutcome,
}

/// Fits and forecasts each store in turn.
pub struct StoreForecaster {
    config: ForecastConfig,
    charts: ChartWriter,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl StoreForecaster {
    pub fn new(config: ForecastConfig, output_dir: impl Into<PathBuf>) -> Self {
        let charts = ChartWriter::new(&config, output_dir);
        Self {
            config,
            charts,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Fit one store and forecast `horizon` weeks past its last observation.
    pub fn forecast_store(&self, series: &WeeklySeries) -> Result<StoreForecast> {
        let last = series.last_date().ok_or(ForecastError::InsufficientData {
            required: self.config.order.d + 1,
            actual: 0,
        })?;

        let fit = Sarima::from_config(&self.config, self.config.enforce_store_constraints)
            .fit(&series.values)?;
        let forecast = fit.forecast(self.config.horizon, self.config.confidence)?;

        Ok(StoreForecast {
            store: series.store,
            dates: future_weeks(last, self.config.horizon),
            forecast,
            model: fit.summary(),
            history_weeks: series.len(),
        })
    }

    /// Forecast every store. A store that cannot be fitted is logged and
    /// listed in [`ForecastBatch::skipped`]; the remaining stores continue.
    pub fn forecast_all(&self, series: &[WeeklySeries]) -> ForecastBatch {
        let mut batch = ForecastBatch::default();
        let total = series.len();
        info!("Forecasting {} stores, {} weeks ahead", total, self.config.horizon);

        for (i, store_series) in series.iter().enumerate() {
            let store = store_series.store;
            self.report(ProgressUpdate::stores(
                Some(store),
                i,
                total,
                format!("Fitting store {} ({}/{})", store, i + 1, total),
            ));

            match self.forecast_store(store_series) {
                Ok(forecast) => {
                    log_store_forecast(&forecast);
                    self.charts.write(
                        &mut batch.charts,
                        &plots::store_chart_name(store),
                        |path, size| plots::store_forecast_chart(path, size, store_series, &forecast),
                    );
                    batch.forecasts.insert(store, forecast);
                }
                Err(e) => {
                    warn!("Skipping store {}: {}", store, e);
                    batch.skipped.push(StoreFailure {
                        store,
                        code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.report(ProgressUpdate::stores(
            None,
            total,
            total,
            format!("Forecast {} of {} stores", batch.forecasts.len(), total),
        ));
        batch
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.reporter {
            reporter.report(update);
        }
    }
}

/// The `horizon` week-ending dates following `last`.
pub fn future_weeks(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|h| last + Duration::weeks(h))
        .collect()
}

fn log_store_forecast(forecast: &StoreForecast) {
    info!(
        "Store {}: AIC {:.2}, BIC {:.2}, next week {:.2} [{:.2}, {:.2}]",
        forecast.store,
        forecast.model.aic,
        forecast.model.bic,
        forecast.forecast.mean.first().copied().unwrap_or(f64::NAN),
        forecast.forecast.lower.first().copied().unwrap_or(f64::NAN),
        forecast.forecast.upper.first().copied().unwrap_or(f64::NAN),
    );
    for (date, value) in forecast.dates.iter().zip(&forecast.forecast.mean) {
        debug!("  {} -> {:.2}", date, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SarimaOrder, SeasonalOrder};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn weekly(store: StoreId, values: Vec<f64>) -> WeeklySeries {
        let start = NaiveDate::from_ymd_opt(2010, 2, 7).unwrap();
        WeeklySeries {
            store,
            dates: (0..values.len() as i64)
                .map(|i| start + Duration::weeks(i))
                .collect(),
            values,
        }
    }

    fn small_config() -> ForecastConfig {
        ForecastConfig::builder()
            .order(SarimaOrder::new(1, 1, 0))
            .seasonal(SeasonalOrder::none())
            .horizon(4)
            .generate_charts(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_future_weeks() {
        let last = NaiveDate::from_ymd_opt(2012, 10, 28).unwrap();
        let dates = future_weeks(last, 2);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2012, 11, 4).unwrap(),
                NaiveDate::from_ymd_opt(2012, 11, 11).unwrap(),
            ]
        );
    }

    #[test]
    fn test_forecast_all_skips_short_series() {
        let dir = tempfile::tempdir().unwrap();
        let forecaster = StoreForecaster::new(small_config(), dir.path());
        let long: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 + (i % 3) as f64).collect();

        let batch = forecaster.forecast_all(&[weekly(1, long), weekly(2, vec![5.0, 6.0])]);

        assert_eq!(batch.forecasts.len(), 1);
        let forecast = &batch.forecasts[&1];
        assert_eq!(forecast.forecast.len(), 4);
        assert_eq!(forecast.dates.len(), 4);
        assert_eq!(forecast.history_weeks, 30);

        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].store, 2);
        assert_eq!(batch.skipped[0].code, "INSUFFICIENT_DATA");
        assert!(batch.charts.written.is_empty());
    }

    #[test]
    fn test_progress_reported_per_store() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = crate::progress::ClosureProgressReporter::new(move |u: ProgressUpdate| {
            sink.lock().unwrap().push(u.steps.map(|s| s.done));
        });
        let forecaster =
            StoreForecaster::new(small_config(), dir.path()).with_reporter(Arc::new(reporter));
        let values: Vec<f64> = (0..20).map(|i| i as f64 * 2.0).collect();

        forecaster.forecast_all(&[weekly(1, values.clone()), weekly(4, values)]);

        assert_eq!(*seen.lock().unwrap(), vec![Some(0), Some(1), Some(2)]);
    }
}
