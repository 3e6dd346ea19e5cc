//! Retail Sales Forecasting Library
//!
//! Per-store seasonal ARIMA forecasting of weekly sales, holdout evaluation
//! and residual diagnostics, on top of [`sales_processing`].
//!
//! # Overview
//!
//! - **Model**: SARIMA(p,d,q)(P,D,Q,s) fitted by conditional sum of squares
//!   with a Nelder-Mead search, forecasting with normal confidence bounds
//! - **Forecasting**: one independent model per store, 12 weeks ahead by
//!   default; stores that cannot be fitted are skipped and reported
//! - **Evaluation**: refit with the last weeks held out and score the
//!   forecast with MAE, MSE, RMSE and MAPE
//! - **Diagnostics**: residual autocorrelation, Ljung-Box test, AIC and BIC
//! - **Pipeline**: the complete run from CSV to charts and a JSON report
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_forecast::{AnalysisPipeline, ForecastConfig};
//! use sales_processing::ProcessingConfig;
//!
//! let report = AnalysisPipeline::builder()
//!     .processing_config(ProcessingConfig::builder().output_dir("outputs").build()?)
//!     .forecast_config(ForecastConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run("Walmart DataSet.csv")?;
//!
//! for (store, forecast) in &report.forecasts {
//!     println!("Store {}: {:?}", store, forecast.forecast.mean);
//! }
//! ```
//!
//! Fitting a single series directly:
//!
//! ```rust,ignore
//! use sales_forecast::{Sarima, SarimaSpec, SarimaOrder, SeasonalOrder};
//!
//! let fit = Sarima::new(SarimaSpec::new(SarimaOrder::new(1, 1, 1), SeasonalOrder::none()))
//!     .fit(&weekly_sales)?;
//! let forecast = fit.forecast(12, 0.95)?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod forecaster;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod plots;
pub mod progress;
pub mod report;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, EvaluationSeries, ForecastConfig, ForecastConfigBuilder, SarimaOrder,
    SeasonalOrder,
};
pub use diagnostics::{LjungBox, ResidualDiagnostics, acf_confidence_band, autocorrelation, ljung_box};
pub use error::{ForecastError, Result, ResultExt};
pub use evaluation::{EvaluationInput, EvaluationResult, HoldoutEvaluator, HoldoutRun};
pub use forecaster::{ForecastBatch, StoreFailure, StoreForecast, StoreForecaster, future_weeks};
pub use metrics::AccuracyMetrics;
pub use model::{FittedSarima, ForecastOutput, ModelSummary, Sarima, SarimaCoefficients, SarimaSpec};
pub use pipeline::{AnalysisPipeline, AnalysisPipelineBuilder};
pub use plots::ChartWriter;
pub use progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate, StepCount,
};
pub use report::{AnalysisReport, REPORT_FILE_NAME, WeeklySummary};
