//! Data cleaning for the sales dataset.
//!
//! This module provides functionality for:
//! - Imputing missing numeric and categorical values
//! - Counting and removing fully duplicate rows
//! - Summarizing categorical distributions after cleaning

use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::loader::{build_records, ParsedDates, COL_HOLIDAY_FLAG, COL_STORE};
use crate::types::{CleaningReport, ImputedKeys, SalesRecord};
use crate::utils::{numeric_column_names, string_column_names, value_counts};
use polars::prelude::*;
use tracing::{debug, info, warn};

const ROW_INDEX: &str = "__source_row";

/// Cleaned frame together with what was done to it.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub data: DataFrame,
    pub report: CleaningReport,
    /// Rows of `data` whose `Store` or `Holiday_Flag` was imputed.
    pub imputed_keys: ImputedKeys,
}

impl CleaningOutcome {
    /// Typed records of the cleaned frame. Imputed store ids and holiday
    /// flags read as `None`, so those rows stay out of per-store and
    /// per-flag groupings.
    pub fn records(&self, dates: &ParsedDates) -> Result<Vec<SalesRecord>> {
        build_records(&self.data, dates, Some(&self.imputed_keys))
    }
}

/// Data cleaner applying the configured imputation and deduplication.
pub struct DataCleaner {
    config: ProcessingConfig,
}

impl DataCleaner {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Clean a dataset.
    ///
    /// 1. Fill numeric nulls (mean by default)
    /// 2. Fill categorical nulls (mode by default)
    /// 3. Count duplicate rows and drop them, keeping the first occurrence
    pub fn clean(&self, df: DataFrame) -> Result<CleaningOutcome> {
        let mut df = df;
        let mut report = CleaningReport {
            rows_before: df.height(),
            ..Default::default()
        };

        info!("Cleaning dataset ({} rows)...", df.height());
        let mut imputed_keys = key_null_masks(&df);

        for col in numeric_column_names(&df) {
            match StatisticalImputer::apply_numeric(&mut df, &col, self.config.numeric_imputation) {
                Ok(Some(record)) => {
                    report.steps.push(format!(
                        "Filled {} missing values in '{}' with {} {}",
                        record.filled_count, record.column, record.strategy, record.fill_value
                    ));
                    report.imputations.push(record);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping imputation of '{}': {}", col, e);
                    report.steps.push(format!("Could not impute '{}': {}", col, e));
                }
            }
        }

        for col in string_column_names(&df) {
            match StatisticalImputer::apply_categorical(
                &mut df,
                &col,
                self.config.categorical_imputation,
                &self.config.categorical_fill_value,
            ) {
                Ok(Some(record)) => {
                    report.steps.push(format!(
                        "Filled {} missing values in '{}' with {} {}",
                        record.filled_count, record.column, record.strategy, record.fill_value
                    ));
                    report.imputations.push(record);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping imputation of '{}': {}", col, e);
                    report.steps.push(format!("Could not impute '{}': {}", col, e));
                }
            }
        }

        let subset: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let unique = df
            .with_row_index(ROW_INDEX.into(), None)?
            .unique_stable(Some(&subset), UniqueKeepStrategy::First, None)?;
        report.duplicates_found = df.height() - unique.height();
        info!("Number of duplicate rows: {}", report.duplicates_found);

        if self.config.remove_duplicates && report.duplicates_found > 0 {
            let kept: Vec<usize> = unique
                .column(ROW_INDEX)?
                .idx()?
                .into_no_null_iter()
                .map(|i| i as usize)
                .collect();
            imputed_keys = imputed_keys.select(&kept);
            df = unique.drop(ROW_INDEX)?;
            report.duplicates_removed = report.duplicates_found;
            report.steps.push(format!(
                "Removed {} duplicate rows",
                report.duplicates_removed
            ));
            debug!("Removed {} duplicate rows", report.duplicates_removed);
        }

        for column in df.get_columns() {
            let nulls = column.null_count();
            if nulls > 0 {
                report.remaining_nulls.insert(column.name().to_string(), nulls);
            }
        }

        for col in string_column_names(&df) {
            let series = df.column(&col)?.as_materialized_series();
            report.categorical_counts.insert(col, value_counts(series));
        }

        report.rows_after = df.height();
        info!(
            "Cleaning complete: {} -> {} rows, {} values imputed",
            report.rows_before,
            report.rows_after,
            report.total_imputed()
        );

        if imputed_keys.count() > 0 {
            debug!("{} store or holiday keys were imputed", imputed_keys.count());
        }

        Ok(CleaningOutcome {
            data: df,
            report,
            imputed_keys,
        })
    }
}

/// Which rows have a null `Store` or `Holiday_Flag` before imputation.
fn key_null_masks(df: &DataFrame) -> ImputedKeys {
    let nulls = |name: &str| -> Vec<bool> {
        df.column(name)
            .map(|c| c.is_null().into_iter().map(|v| v.unwrap_or(false)).collect())
            .unwrap_or_default()
    };
    ImputedKeys {
        store: nulls(COL_STORE),
        holiday_flag: nulls(COL_HOLIDAY_FLAG),
    }
}
