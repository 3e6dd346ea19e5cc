//! Integration tests for loading, cleaning and grouping the sales dataset.
//!
//! These tests run the processing stages end to end over a small fixture
//! with missing values and one duplicated row.

use pretty_assertions::assert_eq;
use sales_processing::loader::{COL_TEMPERATURE, COL_WEEKLY_SALES};
use sales_processing::utils::{column_f64, column_strings};
use sales_processing::aggregation::{holiday_means, sales_by_store};
use sales_processing::{
    load_csv, load_csv_str, weekly_store_series, DataCleaner, DataProfiler, DateParser,
    ExploratoryVisualizer, FillValue, ProcessingConfig, ReportGenerator, CLEANED_FILE_NAME,
};
use std::collections::HashSet;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_sample() -> polars::prelude::DataFrame {
    load_csv(fixtures_path().join("walmart_sample.csv")).expect("Failed to read fixture")
}

fn default_config() -> ProcessingConfig {
    ProcessingConfig::builder()
        .generate_charts(false)
        .build()
        .unwrap()
}

// ============================================================================
// Profiling
// ============================================================================

#[test]
fn test_profile_reports_missing_and_duplicates() {
    let df = load_sample();
    let overview = DataProfiler::profile(&df).unwrap();

    assert_eq!(overview.shape, (14, 8));
    assert_eq!(overview.duplicate_count, 1);
    assert_eq!(overview.total_nulls(), 3);

    let temperature = overview
        .column_profiles
        .iter()
        .find(|p| p.name == COL_TEMPERATURE)
        .unwrap();
    assert_eq!(temperature.null_count, 2);
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_cleaning_leaves_no_missing_values() {
    let outcome = DataCleaner::new(default_config())
        .clean(load_sample())
        .unwrap();

    assert!(outcome.report.remaining_nulls.is_empty());
    for column in outcome.data.get_columns() {
        assert_eq!(column.null_count(), 0, "column {}", column.name());
    }
    assert_eq!(outcome.report.total_imputed(), 3);
}

#[test]
fn test_imputed_value_is_pre_imputation_mean() {
    let df = load_sample();
    let observed: Vec<f64> = column_f64(&df, COL_TEMPERATURE)
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    let expected = observed.iter().sum::<f64>() / observed.len() as f64;

    let outcome = DataCleaner::new(default_config()).clean(df).unwrap();
    let record = outcome
        .report
        .imputations
        .iter()
        .find(|r| r.column == COL_TEMPERATURE)
        .unwrap();
    assert_eq!(record.filled_count, 2);
    match record.fill_value {
        FillValue::Numeric(v) => assert!((v - expected).abs() < 1e-9),
        ref other => panic!("unexpected fill value {:?}", other),
    }

    // row 2 had the first missing temperature and is not affected by dedup
    let cleaned = column_f64(&outcome.data, COL_TEMPERATURE).unwrap();
    assert!((cleaned[2].unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_deduplication_keeps_first_occurrence() {
    let df = load_sample();
    let rows_before = df.height();
    let outcome = DataCleaner::new(default_config()).clean(df).unwrap();

    assert_eq!(outcome.report.duplicates_found, 1);
    assert_eq!(outcome.report.duplicates_removed, 1);
    assert!(outcome.data.height() <= rows_before);
    assert_eq!(outcome.data.height(), 13);

    let columns: Vec<Vec<Option<String>>> = outcome
        .data
        .get_column_names()
        .into_iter()
        .map(|name| column_strings(&outcome.data, name.as_str()).unwrap())
        .collect();
    let mut seen = HashSet::new();
    for i in 0..outcome.data.height() {
        let key: Vec<Option<String>> = columns.iter().map(|c| c[i].clone()).collect();
        assert!(seen.insert(key), "row {} is a duplicate", i);
    }
}

#[test]
fn test_duplicates_kept_when_disabled() {
    let config = ProcessingConfig::builder()
        .remove_duplicates(false)
        .build()
        .unwrap();
    let outcome = DataCleaner::new(config).clean(load_sample()).unwrap();

    assert_eq!(outcome.report.duplicates_found, 1);
    assert_eq!(outcome.report.duplicates_removed, 0);
    assert_eq!(outcome.data.height(), 14);
}

// ============================================================================
// Weekly Grouping
// ============================================================================

#[test]
fn test_weekly_grouping_preserves_total_sales() {
    let outcome = DataCleaner::new(default_config())
        .clean(load_sample())
        .unwrap();
    let dates = DateParser::default().parse_column(&outcome.data).unwrap();
    assert_eq!(dates.failures, 0);

    let records = outcome.records(&dates).unwrap();
    let grouping = weekly_store_series(&records);

    let original: f64 = column_f64(&outcome.data, COL_WEEKLY_SALES)
        .unwrap()
        .into_iter()
        .flatten()
        .sum();
    let grouped: f64 = grouping.series.iter().map(|s| s.total()).sum();
    assert!((original - grouped).abs() < 1e-6 * original.abs());

    let stores: Vec<i64> = grouping.series.iter().map(|s| s.store).collect();
    assert_eq!(stores, vec![1, 2, 3]);
    assert_eq!(grouping.series[1].len(), 6);
    assert_eq!(grouping.filled_weeks, 1);
    assert_eq!(grouping.undated_rows, 0);
    assert_eq!(grouping.storeless_rows, 0);
}

#[test]
fn test_imputed_store_and_holiday_stay_out_of_groupings() {
    let csv = "Store,Date,Weekly_Sales,Holiday_Flag
1,05-02-2010,100,0
1,12-02-2010,100,0
1,19-02-2010,100,0
1,26-02-2010,100,0
1,05-03-2010,100,0
1,12-03-2010,1000,
1,19-03-2010,100,0
2,05-02-2010,900,1
4,05-02-2010,50,0
,12-02-2010,7777,0
";
    let outcome = DataCleaner::new(default_config())
        .clean(load_csv_str(csv).unwrap())
        .unwrap();
    assert!(outcome.report.remaining_nulls.is_empty());

    let dates = DateParser::default().parse_column(&outcome.data).unwrap();
    let records = outcome.records(&dates).unwrap();
    assert_eq!(records.len(), 10);

    assert_eq!(sales_by_store(&records), vec![(1, 1600.0), (2, 900.0), (4, 50.0)]);

    let grouping = weekly_store_series(&records);
    let stores: Vec<i64> = grouping.series.iter().map(|s| s.store).collect();
    assert_eq!(stores, vec![1, 2, 4]);
    assert_eq!(grouping.storeless_rows, 1);
    assert_eq!(grouping.series[0].total(), 1600.0);

    let holiday = holiday_means(&records);
    assert_eq!(holiday.holiday_mean, Some(900.0));
    assert_eq!(holiday.non_holiday_mean, Some(8427.0 / 8.0));
}

// ============================================================================
// Outputs
// ============================================================================

#[test]
fn test_cleaned_dataset_written_to_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProcessingConfig::builder()
        .output_dir(dir.path())
        .generate_charts(false)
        .build()
        .unwrap();
    let mut outcome = DataCleaner::new(config.clone()).clean(load_sample()).unwrap();

    let path = ReportGenerator::new(&config.output_dir)
        .save_dataset(&mut outcome.data, CLEANED_FILE_NAME)
        .unwrap();
    assert_eq!(path, config.cleaned_path());

    let reloaded = load_csv(&path).unwrap();
    assert_eq!(reloaded.shape(), outcome.data.shape());
}

#[test]
fn test_visualizer_disabled_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProcessingConfig::builder()
        .output_dir(dir.path())
        .generate_charts(false)
        .build()
        .unwrap();
    let outcome = DataCleaner::new(config.clone()).clean(load_sample()).unwrap();
    let dates = DateParser::default().parse_column(&outcome.data).unwrap();
    let records = outcome.records(&dates).unwrap();
    let correlation = sales_processing::correlation_matrix(&outcome.data).unwrap();

    let result = ExploratoryVisualizer::new(config).render(&outcome.data, &records, &correlation);
    assert!(result.charts.written.is_empty());
    assert_eq!(result.insights.top_stores[0].0, 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
