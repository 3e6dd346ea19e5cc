//! Statistical imputation methods.
//!
//! Provides mean, median, zero, mode and constant imputation strategies.

use crate::config::{CategoricalImputation, NumericImputation};
use crate::error::{ProcessingError, Result};
use crate::types::{FillValue, ImputationRecord};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, string_mode};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill nulls of a numeric column.
    ///
    /// The fill value is computed from the non-missing values before any
    /// replacement. Returns `None` when the column has no nulls or does not
    /// exist; a column that is entirely null cannot be imputed by mean or
    /// median and yields [`ProcessingError::ImputationFailed`].
    pub fn apply_numeric(
        df: &mut DataFrame,
        col_name: &str,
        strategy: NumericImputation,
    ) -> Result<Option<ImputationRecord>> {
        let Ok(column) = df.column(col_name) else {
            return Ok(None);
        };
        let series = column.as_materialized_series().clone();
        let null_count = series.null_count();
        if null_count == 0 {
            return Ok(None);
        }

        let fill_value = match strategy {
            NumericImputation::Mean => series.mean(),
            NumericImputation::Median => series.median(),
            NumericImputation::Zero => Some(0.0),
        }
        .ok_or_else(|| ProcessingError::ImputationFailed {
            column: col_name.to_string(),
            reason: format!("no non-missing values to compute the {}", strategy.as_str()),
        })?;

        let filled = fill_numeric_nulls(&series, fill_value)?;
        df.replace(col_name, filled)?;

        debug!(
            "Filled {} nulls in '{}' with {}: {:.4}",
            null_count,
            col_name,
            strategy.as_str(),
            fill_value
        );

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            strategy: strategy.as_str().to_string(),
            fill_value: FillValue::Numeric(fill_value),
            filled_count: null_count,
        }))
    }

    /// Fill nulls of a categorical (string) column.
    pub fn apply_categorical(
        df: &mut DataFrame,
        col_name: &str,
        strategy: CategoricalImputation,
        constant: &str,
    ) -> Result<Option<ImputationRecord>> {
        let Ok(column) = df.column(col_name) else {
            return Ok(None);
        };
        let series = column.as_materialized_series().clone();
        let null_count = series.null_count();
        if null_count == 0 {
            return Ok(None);
        }

        let fill_value = match strategy {
            CategoricalImputation::Mode => string_mode(&series),
            CategoricalImputation::Constant => Some(constant.to_string()),
        }
        .ok_or_else(|| ProcessingError::ImputationFailed {
            column: col_name.to_string(),
            reason: "no non-missing values to compute the mode".to_string(),
        })?;

        let filled = fill_string_nulls(&series, &fill_value)?;
        df.replace(col_name, filled)?;

        debug!(
            "Filled {} nulls in '{}' with {}: '{}'",
            null_count,
            col_name,
            strategy.as_str(),
            fill_value
        );

        Ok(Some(ImputationRecord {
            column: col_name.to_string(),
            strategy: strategy.as_str().to_string(),
            fill_value: FillValue::Text(fill_value),
            filled_count: null_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_at(df: &DataFrame, col: &str, i: usize) -> f64 {
        df.column(col).unwrap().get(i).unwrap().try_extract::<f64>().unwrap()
    }

    // ========================================================================
    // apply_numeric() tests
    // ========================================================================

    #[test]
    fn test_apply_numeric_mean_basic() {
        let mut df = df![
            "Temperature" => [Some(1.0), None, Some(5.0)],
        ]
        .unwrap();

        let record = StatisticalImputer::apply_numeric(&mut df, "Temperature", NumericImputation::Mean)
            .unwrap()
            .unwrap();

        // Mean of [1, 5] = 3
        assert_eq!(df.column("Temperature").unwrap().null_count(), 0);
        assert_eq!(value_at(&df, "Temperature", 1), 3.0);
        assert_eq!(record.fill_value, FillValue::Numeric(3.0));
        assert_eq!(record.filled_count, 1);
        assert_eq!(record.strategy, "mean");
    }

    #[test]
    fn test_apply_numeric_mean_uses_pre_imputation_values() {
        let mut df = df![
            "CPI" => [Some(10.0), None, None, Some(20.0), Some(60.0)],
        ]
        .unwrap();

        StatisticalImputer::apply_numeric(&mut df, "CPI", NumericImputation::Mean).unwrap();

        assert_eq!(value_at(&df, "CPI", 1), 30.0);
        assert_eq!(value_at(&df, "CPI", 2), 30.0);
        assert_eq!(value_at(&df, "CPI", 4), 60.0);
    }

    #[test]
    fn test_apply_numeric_integer_column() {
        let mut df = df![
            "Holiday_Flag" => [Some(0i64), Some(1), None, Some(0)],
        ]
        .unwrap();

        StatisticalImputer::apply_numeric(&mut df, "Holiday_Flag", NumericImputation::Mean).unwrap();

        let imputed = value_at(&df, "Holiday_Flag", 2);
        assert!((imputed - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_numeric_median_and_zero() {
        let mut df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(10.0)],
            "b" => [Some(1.0), None, Some(3.0), Some(10.0)],
        ]
        .unwrap();

        StatisticalImputer::apply_numeric(&mut df, "a", NumericImputation::Median).unwrap();
        StatisticalImputer::apply_numeric(&mut df, "b", NumericImputation::Zero).unwrap();

        assert_eq!(value_at(&df, "a", 1), 3.0);
        assert_eq!(value_at(&df, "b", 1), 0.0);
    }

    #[test]
    fn test_apply_numeric_no_nulls() {
        let mut df = df!["values" => [1.0, 2.0, 3.0]].unwrap();
        let record =
            StatisticalImputer::apply_numeric(&mut df, "values", NumericImputation::Mean).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_apply_numeric_all_nulls_fails() {
        let mut df = df!["values" => [Option::<f64>::None, None]].unwrap();
        let err = StatisticalImputer::apply_numeric(&mut df, "values", NumericImputation::Mean)
            .unwrap_err();
        assert_eq!(err.error_code(), "IMPUTATION_FAILED");
    }

    #[test]
    fn test_apply_numeric_nonexistent_column() {
        let mut df = df!["other" => [1.0, 2.0]].unwrap();
        let record =
            StatisticalImputer::apply_numeric(&mut df, "values", NumericImputation::Mean).unwrap();
        assert!(record.is_none());
    }

    // ========================================================================
    // apply_categorical() tests
    // ========================================================================

    #[test]
    fn test_apply_categorical_mode() {
        let mut df = df![
            "Category" => [Some("Food"), None, Some("Food"), Some("Toys")],
        ]
        .unwrap();

        let record = StatisticalImputer::apply_categorical(
            &mut df,
            "Category",
            CategoricalImputation::Mode,
            "Unknown",
        )
        .unwrap()
        .unwrap();

        let values: Vec<Option<&str>> = df
            .column("Category")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values[1], Some("Food"));
        assert_eq!(record.fill_value, FillValue::Text("Food".to_string()));
    }

    #[test]
    fn test_apply_categorical_constant() {
        let mut df = df!["Category" => [Some("Food"), None]].unwrap();

        StatisticalImputer::apply_categorical(
            &mut df,
            "Category",
            CategoricalImputation::Constant,
            "Unknown",
        )
        .unwrap();

        let filled = df
            .column("Category")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(1);
        assert_eq!(filled, Some("Unknown"));
    }
}
