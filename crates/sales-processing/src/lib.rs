//! Retail Sales Processing Library
//!
//! Loading, profiling, cleaning and exploratory charting of weekly store
//! sales data, built on Polars and plotters.
//!
//! # Overview
//!
//! - **Loading**: CSV reading with fallbacks, column presence checks and
//!   coercing date parsing
//! - **Profiling**: shape, head preview, null counts, describe table,
//!   categorical value counts and Pearson correlations
//! - **Cleaning**: mean/mode imputation and first-occurrence deduplication
//! - **Aggregation**: sales totals by store, month, year, weekday, holiday
//!   flag and category, plus regular per-store weekly series
//! - **Charts**: the fixed set of exploratory PNG charts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_processing::{DataCleaner, DataProfiler, DateParser, ProcessingConfig};
//! use sales_processing::{load_csv, weekly_store_series};
//!
//! let df = load_csv("Walmart DataSet.csv")?;
//! let overview = DataProfiler::profile(&df)?;
//!
//! let config = ProcessingConfig::builder().output_dir("outputs").build()?;
//! let outcome = DataCleaner::new(config).clean(df)?;
//!
//! let dates = DateParser::default().parse_column(&outcome.data)?;
//! let records = outcome.records(&dates)?;
//! let grouping = weekly_store_series(&records);
//! println!("{} stores", grouping.series.len());
//! ```

pub mod aggregation;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;
pub mod visualizer;

// Re-exports for convenient access
pub use aggregation::{
    chain_total_series, holiday_means, sales_by_category, sales_by_day_of_week, sales_by_month,
    sales_by_store, sales_by_year, stacked_series, week_ending, weekly_store_series,
};
pub use cleaner::{CleaningOutcome, DataCleaner};
pub use config::{
    CategoricalImputation, ConfigValidationError, NumericImputation, ProcessingConfig,
    ProcessingConfigBuilder, CLEANED_FILE_NAME,
};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::{
    load_csv, load_csv_str, records_from_frame, ColumnPresence, DateParser, ParsedDates,
};
pub use profiler::{correlation_matrix, DataProfiler};
pub use reporting::ReportGenerator;
pub use types::{
    ChartFailure, ChartOutcome, CleaningReport, ColumnProfile, CorrelationMatrix,
    DatasetOverview, FillValue, HolidayComparison, ImputationRecord, ImputedKeys, NumericSummary,
    SalesInsights, SalesRecord, StoreId, WeeklyGrouping, WeeklySeries,
};
pub use visualizer::{ExploratoryResult, ExploratoryVisualizer};
