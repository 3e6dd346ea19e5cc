//! End-to-end analysis run: load, profile, clean, chart, forecast, evaluate.

use crate::config::ForecastConfig;
use crate::diagnostics::ResidualDiagnostics;
use crate::error::{ForecastError, Result, ResultExt};
use crate::evaluation::{EvaluationInput, HoldoutEvaluator};
use crate::forecaster::StoreForecaster;
use crate::plots::{self, ChartWriter};
use crate::progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use crate::report::{AnalysisReport, REPORT_FILE_NAME, WeeklySummary};
use sales_processing::{
    CLEANED_FILE_NAME, ChartOutcome, ColumnPresence, DataCleaner, DataProfiler, DateParser,
    ExploratoryVisualizer, ParsedDates, ProcessingConfig, ReportGenerator, WeeklyGrouping,
    correlation_matrix, load_csv, weekly_store_series,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs the complete analysis for one CSV file.
///
/// # Example
///
/// ```rust,ignore
/// use sales_forecast::{AnalysisPipeline, ForecastConfig};
///
/// let report = AnalysisPipeline::builder()
///     .forecast_config(ForecastConfig::builder().horizon(8).build()?)
///     .build()?
///     .run("Walmart DataSet.csv")?;
/// println!("{} stores forecast", report.forecasts.len());
/// ```
pub struct AnalysisPipeline {
    processing: ProcessingConfig,
    forecast: ForecastConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(AnalysisPipeline: Send);

impl AnalysisPipeline {
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::default()
    }

    pub fn output_dir(&self) -> &Path {
        &self.processing.output_dir
    }

    /// Run every stage and write `analysis_report.json` into the output
    /// directory.
    ///
    /// Loading, profiling and cleaning failures abort the run. Chart, store
    /// and evaluation failures are logged and recorded in the report.
    pub fn run(&self, input: impl AsRef<Path>) -> Result<AnalysisReport> {
        match self.run_internal(input.as_ref()) {
            Ok(report) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(report)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Analysis error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage(&self, stage: AnalysisStage, message: &str) {
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn run_internal(&self, input: &Path) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let output_dir = self.processing.output_dir.clone();
        let mut warnings = Vec::new();
        let mut charts = ChartOutcome::default();

        fs::create_dir_all(&output_dir).map_err(|e| {
            ForecastError::from(e).with_context(format!(
                "Failed to create output directory {}",
                output_dir.display()
            ))
        })?;

        // Step 1: Load
        self.stage(AnalysisStage::Loading, "Loading dataset...");
        let df = load_csv(input).context("Failed to load dataset")?;
        let presence = ColumnPresence::detect(&df);
        let missing_columns: Vec<String> = presence
            .missing_expected()
            .into_iter()
            .map(String::from)
            .collect();
        for column in &missing_columns {
            warn!("Expected column '{}' is missing", column);
            warnings.push(format!("Column '{}' is missing", column));
        }

        // Step 2: Profile
        self.stage(AnalysisStage::Profiling, "Profiling dataset...");
        let overview = DataProfiler::profile(&df).context("Failed to profile dataset")?;

        // Step 3: Clean
        self.stage(AnalysisStage::Cleaning, "Cleaning dataset...");
        let mut cleaned = DataCleaner::new(self.processing.clone())
            .clean(df)
            .context("Failed to clean dataset")?;
        let cleaned_file = if self.processing.save_cleaned {
            let path = ReportGenerator::new(&output_dir)
                .save_dataset(&mut cleaned.data, CLEANED_FILE_NAME)
                .context("Failed to save cleaned dataset")?;
            Some(path)
        } else {
            None
        };

        // Step 4: Explore
        self.stage(AnalysisStage::Visualizing, "Rendering exploratory charts...");
        let correlation =
            correlation_matrix(&cleaned.data).context("Failed to compute correlations")?;
        let dates = if presence.date {
            DateParser::default()
                .parse_column(&cleaned.data)
                .context("Failed to parse dates")?
        } else {
            ParsedDates::default()
        };
        if dates.failures > 0 {
            warnings.push(format!("{} dates could not be parsed", dates.failures));
        }
        let records = if presence.store && presence.weekly_sales {
            cleaned.records(&dates).context("Failed to read sales records")?
        } else {
            Vec::new()
        };
        let exploratory = ExploratoryVisualizer::new(self.processing.clone()).render(
            &cleaned.data,
            &records,
            &correlation,
        );
        charts.merge(exploratory.charts);

        // Step 5: Aggregate
        self.stage(AnalysisStage::Aggregating, "Building weekly store series...");
        let grouping = if presence.supports_time_series() {
            weekly_store_series(&records)
        } else {
            warn!("Date, Store and Weekly_Sales are required for forecasting; skipping");
            warnings.push("Forecasting skipped: Date, Store or Weekly_Sales is missing".to_string());
            WeeklyGrouping {
                series: Vec::new(),
                undated_rows: 0,
                storeless_rows: 0,
                filled_weeks: 0,
            }
        };

        if grouping.storeless_rows > 0 {
            warnings.push(format!(
                "{} rows without a store id left out of the weekly series",
                grouping.storeless_rows
            ));
        }

        // Step 6: Forecast each store
        self.stage(AnalysisStage::Forecasting, "Forecasting stores...");
        let mut forecaster = StoreForecaster::new(self.forecast.clone(), &output_dir);
        if let Some(reporter) = &self.progress_reporter {
            forecaster = forecaster.with_reporter(Arc::clone(reporter));
        }
        let batch = forecaster.forecast_all(&grouping.series);
        charts.merge(batch.charts);
        for failure in &batch.skipped {
            warnings.push(format!("Store {} skipped: {}", failure.store, failure.message));
        }

        // Step 7: Holdout evaluation
        self.stage(AnalysisStage::Evaluating, "Evaluating holdout forecast...");
        let mut evaluation = None;
        let mut evaluation_error = None;
        let mut diagnostics = None;
        if grouping.series.is_empty() {
            evaluation_error = Some("No weekly series to evaluate".to_string());
        } else {
            let series =
                EvaluationInput::from_weekly(self.forecast.evaluation_series, &grouping.series);
            match HoldoutEvaluator::new(self.forecast.clone(), &output_dir).evaluate(&series) {
                Ok(run) => {
                    charts.merge(run.charts);

                    // Step 8: Residual diagnostics on the evaluation fit
                    self.stage(AnalysisStage::Diagnostics, "Checking residuals...");
                    let checks = ResidualDiagnostics::from_fit(
                        &run.fit,
                        self.forecast.acf_lags,
                        self.forecast.ljung_box_lags,
                    );
                    ChartWriter::new(&self.forecast, &output_dir).write(
                        &mut charts,
                        plots::RESIDUALS_PLOT,
                        |path, size| plots::residual_chart(path, size, &checks),
                    );
                    diagnostics = Some(checks);
                    evaluation = Some(run.result);
                }
                Err(e) => {
                    warn!("Holdout evaluation failed: {}", e);
                    warnings.push(format!("Evaluation failed: {}", e));
                    evaluation_error = Some(e.to_string());
                }
            }
        }

        // Step 9: Report
        self.stage(AnalysisStage::Reporting, "Writing report...");
        let report = AnalysisReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            input_file: input.to_path_buf(),
            output_dir: output_dir.clone(),
            overview,
            cleaning: cleaned.report,
            cleaned_file,
            correlation,
            date_parse_failures: dates.failures,
            missing_columns,
            insights: exploratory.insights,
            weekly: WeeklySummary::from_grouping(&grouping),
            forecasts: batch.forecasts,
            skipped_stores: batch.skipped,
            evaluation,
            evaluation_error,
            diagnostics,
            charts,
            warnings,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        ReportGenerator::new(&output_dir)
            .write_json(&report, REPORT_FILE_NAME)
            .context("Failed to write analysis report")?;

        info!(
            "Analysis complete in {}ms: {} stores forecast, {} charts written",
            report.duration_ms,
            report.forecasts.len(),
            report.charts.written.len()
        );
        Ok(report)
    }
}

/// Builder for [`AnalysisPipeline`].
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    processing: Option<ProcessingConfig>,
    forecast: Option<ForecastConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(AnalysisPipelineBuilder: Send);

impl AnalysisPipelineBuilder {
    pub fn processing_config(mut self, config: ProcessingConfig) -> Self {
        self.processing = Some(config);
        self
    }

    pub fn forecast_config(mut self, config: ForecastConfig) -> Self {
        self.forecast = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// ```rust,ignore
    /// let pipeline = AnalysisPipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating both configurations.
    pub fn build(self) -> Result<AnalysisPipeline> {
        let processing = self.processing.unwrap_or_default();
        processing
            .validate()
            .map_err(|e| ForecastError::InvalidConfig(e.to_string()))?;
        let forecast = self.forecast.unwrap_or_default();
        forecast
            .validate()
            .map_err(|e| ForecastError::InvalidConfig(e.to_string()))?;

        Ok(AnalysisPipeline {
            processing,
            forecast,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeasonalOrder;
    use std::sync::Mutex;

    #[test]
    fn test_build_rejects_invalid_forecast_config() {
        let mut config = ForecastConfig::default();
        config.horizon = 0;
        let err = AnalysisPipeline::builder()
            .forecast_config(config)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_missing_input_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stages);
        let pipeline = AnalysisPipeline::builder()
            .processing_config(
                ProcessingConfig::builder()
                    .output_dir(dir.path())
                    .generate_charts(false)
                    .build()
                    .unwrap(),
            )
            .on_progress(move |u| sink.lock().unwrap().push(u.stage))
            .build()
            .unwrap();

        assert!(pipeline.run(dir.path().join("absent.csv")).is_err());
        assert_eq!(stages.lock().unwrap().last(), Some(&AnalysisStage::Failed));
    }

    #[test]
    fn test_run_without_date_column_skips_forecasting() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("no_dates.csv");
        fs::write(
            &input,
            "Store,Weekly_Sales,Holiday_Flag\n1,100.0,0\n1,120.0,1\n2,90.0,0\n",
        )
        .unwrap();

        let report = AnalysisPipeline::builder()
            .processing_config(
                ProcessingConfig::builder()
                    .output_dir(dir.path().join("out"))
                    .generate_charts(false)
                    .build()
                    .unwrap(),
            )
            .forecast_config(
                ForecastConfig::builder()
                    .seasonal(SeasonalOrder::none())
                    .generate_charts(false)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
            .run(&input)
            .unwrap();

        assert!(report.forecasts.is_empty());
        assert!(report.evaluation.is_none());
        assert!(report.evaluation_error.is_some());
        assert!(report.missing_columns.contains(&"Date".to_string()));
        assert_eq!(report.insights.top_stores.first().map(|s| s.0), Some(1));
        assert!(dir.path().join("out").join(REPORT_FILE_NAME).exists());
    }
}
