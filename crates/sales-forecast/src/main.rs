//! CLI entry point for the retail sales analysis.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use sales_forecast::{AnalysisPipeline, AnalysisReport, EvaluationSeries, ForecastConfig};
use sales_processing::{CategoricalImputation, NumericImputation, ProcessingConfig};
use std::path::Path;
use tracing::{error, info};

/// CLI-compatible evaluation series enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEvaluationSeries {
    /// Every store's weekly series concatenated in store order
    Stacked,
    /// Weekly totals across all stores
    ChainTotal,
}

impl From<CliEvaluationSeries> for EvaluationSeries {
    fn from(cli: CliEvaluationSeries) -> Self {
        match cli {
            CliEvaluationSeries::Stacked => EvaluationSeries::Stacked,
            CliEvaluationSeries::ChainTotal => EvaluationSeries::ChainTotal,
        }
    }
}

/// CLI-compatible numeric imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericImputation {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use zero as the fill value
    Zero,
}

impl From<CliNumericImputation> for NumericImputation {
    fn from(cli: CliNumericImputation) -> Self {
        match cli {
            CliNumericImputation::Mean => NumericImputation::Mean,
            CliNumericImputation::Median => NumericImputation::Median,
            CliNumericImputation::Zero => NumericImputation::Zero,
        }
    }
}

/// CLI-compatible categorical imputation strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCategoricalImputation {
    /// Use the most frequent value (mode)
    Mode,
    /// Use a constant value ("Unknown")
    Constant,
}

impl From<CliCategoricalImputation> for CategoricalImputation {
    fn from(cli: CliCategoricalImputation) -> Self {
        match cli {
            CliCategoricalImputation::Mode => CategoricalImputation::Mode,
            CliCategoricalImputation::Constant => CategoricalImputation::Constant,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Weekly retail sales analysis and per-store SARIMA forecasting",
    long_about = "Profiles and cleans a weekly store sales CSV, renders exploratory charts, \
                  fits one seasonal ARIMA model per store and evaluates a holdout forecast.\n\n\
                  EXAMPLES:\n  \
                  # Default run on ./Walmart DataSet.csv\n  \
                  sales-forecast\n\n  \
                  # Custom input and output, 8-week horizon\n  \
                  sales-forecast -i sales.csv -o results/ --horizon 8\n\n  \
                  # Evaluate on chain-wide totals, no charts, JSON to stdout\n  \
                  sales-forecast --evaluation-series chain-total --no-charts --json"
)]
struct Args {
    /// Path to the sales CSV file
    #[arg(short, long, default_value = "Walmart DataSet.csv")]
    input: String,

    /// Output directory for the cleaned dataset, charts and report
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Weeks to forecast for each store
    #[arg(long, default_value = "12")]
    horizon: usize,

    /// Observations held out for evaluation
    #[arg(long, default_value = "12")]
    holdout: usize,

    /// Confidence level of the forecast bounds (0.0 - 1.0)
    #[arg(long, default_value = "0.95")]
    confidence: f64,

    /// Series used for the holdout evaluation
    #[arg(long, value_enum, default_value = "stacked")]
    evaluation_series: CliEvaluationSeries,

    /// Strategy for imputing missing numeric values
    #[arg(long, value_enum, default_value = "mean")]
    numeric_imputation: CliNumericImputation,

    /// Strategy for imputing missing categorical values
    #[arg(long, value_enum, default_value = "mode")]
    categorical_imputation: CliCategoricalImputation,

    /// Keep duplicate rows instead of removing them
    #[arg(long)]
    keep_duplicates: bool,

    /// Skip writing the cleaned dataset
    #[arg(long)]
    no_save_cleaned: bool,

    /// Skip all chart rendering
    #[arg(long)]
    no_charts: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the JSON report to stdout instead of a human-readable summary
    ///
    /// Disables all logs. Useful for piping: `... --json | jq .evaluation.metrics`
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let processing = ProcessingConfig::builder()
        .output_dir(&args.output)
        .numeric_imputation(args.numeric_imputation.into())
        .categorical_imputation(args.categorical_imputation.into())
        .remove_duplicates(!args.keep_duplicates)
        .save_cleaned(!args.no_save_cleaned)
        .generate_charts(!args.no_charts)
        .build()?;

    let forecast = ForecastConfig::builder()
        .horizon(args.horizon)
        .holdout(args.holdout)
        .confidence(args.confidence)
        .evaluation_series(args.evaluation_series.into())
        .generate_charts(!args.no_charts)
        .build()?;

    let mut builder = AnalysisPipeline::builder()
        .processing_config(processing)
        .forecast_config(forecast);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    info!("{}", "=".repeat(80));
    info!("Starting sales analysis on {}", args.input);
    info!("{}", "=".repeat(80));

    let report = match builder.build()?.run(&args.input) {
        Ok(report) => report,
        Err(e) => {
            error!("Analysis failed: {}", e);
            return Err(anyhow!("Analysis failed: {}", e));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&report);
    }

    Ok(())
}

/// Print the run summary.
///
/// Uses `println!` so the summary shows regardless of the log level.
fn print_human_readable_summary(report: &AnalysisReport) {
    let (rows, cols) = report.overview.shape;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file.display(),
        rows,
        cols
    );
    match &report.cleaned_file {
        Some(path) => println!(
            "Output: {} ({} rows)",
            path.display(),
            report.cleaning.rows_after
        ),
        None => println!("Output: {}", report.output_dir.display()),
    }
    println!();

    println!("CLEANING");
    println!("{}", "-".repeat(40));
    println!("  Values imputed:     {}", report.cleaning.total_imputed());
    for record in &report.cleaning.imputations {
        println!(
            "    - {} ({}): {} filled with {}",
            record.column, record.strategy, record.filled_count, record.fill_value
        );
    }
    println!("  Duplicates removed: {}", report.cleaning.duplicates_removed);
    if report.date_parse_failures > 0 {
        println!("  Unparsed dates:     {}", report.date_parse_failures);
    }
    println!();

    println!("INSIGHTS");
    println!("{}", "-".repeat(40));
    for (store, total) in &report.insights.top_stores {
        println!("  Store {:<4} {:>18.2}", store, total);
    }
    if let (Some(holiday), Some(regular)) = (
        report.insights.holiday.holiday_mean,
        report.insights.holiday.non_holiday_mean,
    ) {
        println!("  Holiday weeks average {:.2} vs {:.2} otherwise", holiday, regular);
    }
    println!();

    println!("FORECASTS");
    println!("{}", "-".repeat(40));
    println!(
        "  {} stores, {}-{} weeks of history",
        report.weekly.stores, report.weekly.min_weeks, report.weekly.max_weeks
    );
    println!(
        "  {} forecast, {} skipped",
        report.forecasts.len(),
        report.skipped_stores.len()
    );
    for (store, forecast) in &report.forecasts {
        if let (Some(date), Some(mean)) = (forecast.dates.first(), forecast.forecast.mean.first()) {
            println!(
                "  Store {:<4} {} {:>14.2}  (AIC {:.1})",
                store, date, mean, forecast.model.aic
            );
        }
    }
    for failure in &report.skipped_stores {
        println!("  Store {:<4} skipped: {}", failure.store, failure.message);
    }
    println!();

    println!("EVALUATION");
    println!("{}", "-".repeat(40));
    match (&report.evaluation, &report.evaluation_error) {
        (Some(evaluation), _) => {
            let m = &evaluation.metrics;
            println!(
                "  Series: {} ({} train / {} test)",
                evaluation.series.as_str(),
                evaluation.train_len,
                evaluation.test_len
            );
            println!("  MAE:  {:.2}", m.mae);
            println!("  MSE:  {:.2}", m.mse);
            println!("  RMSE: {:.2}", m.rmse);
            match m.mape {
                Some(mape) => println!("  MAPE: {:.2}%", mape),
                None => println!("  MAPE: undefined"),
            }
        }
        (None, Some(reason)) => println!("  Not available: {}", reason),
        (None, None) => println!("  Not run"),
    }
    if let Some(diagnostics) = &report.diagnostics {
        println!("  AIC: {:.3}  BIC: {:.3}", diagnostics.aic, diagnostics.bic);
        if let Some(test) = &diagnostics.ljung_box {
            println!(
                "  Ljung-Box Q({}) = {:.3}, p = {:.4}",
                test.lags, test.statistic, test.p_value
            );
        }
    }
    println!();

    println!(
        "Charts: {} written, {} failed",
        report.charts.written.len(),
        report.charts.failed.len()
    );
    for warning in &report.warnings {
        println!("  ! {}", warning);
    }
    println!("Completed in {}ms", report.duration_ms);
    println!();
    println!("Use --json for machine-readable output");
}
