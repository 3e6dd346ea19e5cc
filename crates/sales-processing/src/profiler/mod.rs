//! Dataset profiling for the initial exploration step.
//!
//! This module provides:
//! - Shape, head preview and dtypes
//! - Per-column missing value counts
//! - The numeric describe table and correlation matrix
//! - Categorical value counts

mod statistics;

use crate::error::Result;
use crate::types::{ColumnProfile, DatasetOverview};
use crate::utils::{any_value_to_string, string_column_names, value_counts};
use polars::prelude::*;
use rand::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub use statistics::{correlation_matrix, describe_numeric, pearson};

/// Number of rows shown in the head preview.
const HEAD_ROWS: usize = 5;

/// Number of sample values kept per column.
const SAMPLE_VALUES: usize = 5;

/// Data profiler for analyzing dataset structure and characteristics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    pub fn profile(df: &DataFrame) -> Result<DatasetOverview> {
        let column_profiles = df
            .get_column_names()
            .into_iter()
            .map(|name| Self::profile_column(df, name.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let duplicate_count = Self::count_duplicates(df)?;
        let numeric_summary = describe_numeric(df)?;

        let mut categorical_counts = BTreeMap::new();
        for name in string_column_names(df) {
            let series = df.column(&name)?.as_materialized_series();
            categorical_counts.insert(name, value_counts(series));
        }

        let overview = DatasetOverview {
            shape: (df.height(), df.width()),
            head: Self::head_rows(df, HEAD_ROWS),
            column_profiles,
            numeric_summary,
            categorical_counts,
            duplicate_count,
        };

        info!(
            "Profiled dataset: {} rows x {} columns, {} missing values, {} duplicate rows",
            overview.shape.0,
            overview.shape.1,
            overview.total_nulls(),
            overview.duplicate_count
        );
        Ok(overview)
    }

    /// Count rows that are exact copies of an earlier row.
    pub fn count_duplicates(df: &DataFrame) -> Result<usize> {
        if df.height() == 0 {
            return Ok(0);
        }
        let unique = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
        Ok(df.height() - unique.height())
    }

    fn profile_column(df: &DataFrame, col_name: &str) -> Result<ColumnProfile> {
        let series = df.column(col_name)?.as_materialized_series();
        let null_count = series.null_count();
        let null_percentage = if df.height() > 0 {
            (null_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        let mut sample_values = Vec::new();
        let non_null = series.drop_nulls();
        if !non_null.is_empty() {
            let sample_size = SAMPLE_VALUES.min(non_null.len());
            let mut rng = StdRng::seed_from_u64(42);
            let indices: Vec<usize> = (0..non_null.len()).collect();
            for idx in indices.choose_multiple(&mut rng, sample_size) {
                if let Ok(val) = non_null.get(*idx) {
                    sample_values.push(any_value_to_string(&val));
                }
            }
        }

        debug!("Profiled column '{}' ({} nulls)", col_name, null_count);

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype: format!("{}", series.dtype()),
            null_count,
            null_percentage,
            unique_count: series.n_unique()?,
            sample_values,
        })
    }

    fn head_rows(df: &DataFrame, n: usize) -> Vec<Vec<String>> {
        let rows = n.min(df.height());
        (0..rows)
            .map(|i| {
                df.get_columns()
                    .iter()
                    .map(|col| {
                        col.get(i)
                            .map(|v| any_value_to_string(&v))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df![
            "Store" => [1i64, 1, 2, 2, 2, 3],
            "Weekly_Sales" => [Some(10.0), Some(20.0), None, Some(40.0), Some(40.0), Some(60.0)],
            "Type" => [Some("A"), Some("A"), Some("B"), None, None, Some("A")],
        ]
        .unwrap()
    }

    #[test]
    fn test_profile_shape_and_head() {
        let overview = DataProfiler::profile(&sample_frame()).unwrap();
        assert_eq!(overview.shape, (6, 3));
        assert_eq!(overview.head.len(), 5);
        assert_eq!(overview.head[0].len(), 3);
        assert_eq!(overview.head[0][0], "1");
        assert_eq!(overview.head[0][2], "A");
    }

    #[test]
    fn test_profile_null_counts() {
        let overview = DataProfiler::profile(&sample_frame()).unwrap();
        let sales = &overview.column_profiles[1];
        assert_eq!(sales.name, "Weekly_Sales");
        assert_eq!(sales.null_count, 1);
        assert!((sales.null_percentage - 100.0 / 6.0).abs() < 1e-9);
        assert_eq!(overview.total_nulls(), 3);
    }

    #[test]
    fn test_profile_counts_duplicates() {
        let overview = DataProfiler::profile(&sample_frame()).unwrap();
        // rows 3 and 4 are identical (2, 40.0, null)
        assert_eq!(overview.duplicate_count, 1);
    }

    #[test]
    fn test_profile_categorical_counts() {
        let overview = DataProfiler::profile(&sample_frame()).unwrap();
        let counts = overview.categorical_counts.get("Type").unwrap();
        assert_eq!(counts[0], ("A".to_string(), 3));
    }

    #[test]
    fn test_profile_empty_frame() {
        let df = DataFrame::empty();
        let overview = DataProfiler::profile(&df).unwrap();
        assert_eq!(overview.shape, (0, 0));
        assert!(overview.head.is_empty());
        assert_eq!(overview.duplicate_count, 0);
    }
}
