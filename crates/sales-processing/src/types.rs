use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store identifier as it appears in the `Store` column.
pub type StoreId = i64;

// ============================================================================
// Profiling Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
}

/// One column of the describe table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); `NaN` for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major Pearson coefficients; `None` where a pair has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == col)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub shape: (usize, usize),
    /// First rows rendered as strings, one inner vec per row.
    pub head: Vec<Vec<String>>,
    pub column_profiles: Vec<ColumnProfile>,
    pub numeric_summary: Vec<NumericSummary>,
    /// Value counts for string columns, most frequent first.
    pub categorical_counts: BTreeMap<String, Vec<(String, usize)>>,
    pub duplicate_count: usize,
}

impl DatasetOverview {
    pub fn total_nulls(&self) -> usize {
        self.column_profiles.iter().map(|c| c.null_count).sum()
    }

    pub fn summary_for(&self, column: &str) -> Option<&NumericSummary> {
        self.numeric_summary.iter().find(|s| s.column == column)
    }
}

// ============================================================================
// Cleaning Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Numeric(f64),
    Text(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Numeric(v) => write!(f, "{:.4}", v),
            FillValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// One imputation applied by the cleaner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub strategy: String,
    pub fill_value: FillValue,
    pub filled_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub imputations: Vec<ImputationRecord>,
    pub duplicates_found: usize,
    pub duplicates_removed: usize,
    /// Nulls left after cleaning, keyed by column (only non-zero entries).
    pub remaining_nulls: BTreeMap<String, usize>,
    pub categorical_counts: BTreeMap<String, Vec<(String, usize)>>,
    pub steps: Vec<String>,
}

/// Rows whose grouping keys were filled in by imputation, aligned with the
/// cleaned frame. Empty when the column is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputedKeys {
    pub store: Vec<bool>,
    pub holiday_flag: Vec<bool>,
}

impl ImputedKeys {
    /// Keep the entries of `rows`, in that order.
    pub fn select(&self, rows: &[usize]) -> Self {
        let pick = |mask: &[bool]| {
            if mask.is_empty() {
                Vec::new()
            } else {
                rows.iter().map(|&i| mask.get(i).copied().unwrap_or(false)).collect()
            }
        };
        Self {
            store: pick(&self.store),
            holiday_flag: pick(&self.holiday_flag),
        }
    }

    pub fn count(&self) -> usize {
        self.store.iter().chain(&self.holiday_flag).filter(|v| **v).count()
    }
}

impl CleaningReport {
    pub fn total_imputed(&self) -> usize {
        self.imputations.iter().map(|r| r.filled_count).sum()
    }
}

// ============================================================================
// Sales Records & Series
// ============================================================================

/// Typed view of one row of the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// `None` when the row has no usable store id.
    pub store: Option<StoreId>,
    pub date: Option<NaiveDate>,
    pub weekly_sales: f64,
    pub holiday_flag: Option<bool>,
    pub temperature: Option<f64>,
    pub fuel_price: Option<f64>,
    pub cpi: Option<f64>,
    pub unemployment: Option<f64>,
    pub category: Option<String>,
}

/// Regular weekly series for a single store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub store: StoreId,
    /// Week-ending dates (Sundays), consecutive.
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Result of grouping records into weekly series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyGrouping {
    pub series: Vec<WeeklySeries>,
    /// Rows skipped because their date could not be parsed.
    pub undated_rows: usize,
    /// Dated rows skipped because they have no usable store id.
    pub storeless_rows: usize,
    /// Weeks inserted with zero sales to keep each index regular.
    pub filled_weeks: usize,
}

// ============================================================================
// Insights
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidayComparison {
    pub holiday_mean: Option<f64>,
    pub non_holiday_mean: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesInsights {
    pub top_stores: Vec<(StoreId, f64)>,
    pub bottom_stores: Vec<(StoreId, f64)>,
    pub top_months: Vec<(String, f64)>,
    pub best_day_of_week: Option<(String, f64)>,
    pub holiday: HolidayComparison,
    pub top_categories: Vec<(String, f64)>,
}

// ============================================================================
// Chart Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartFailure {
    pub chart: String,
    pub reason: String,
}

/// Files written by a charting stage and the charts that could not be drawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartOutcome {
    pub written: Vec<String>,
    pub failed: Vec<ChartFailure>,
    pub skipped: Vec<String>,
}

impl ChartOutcome {
    pub fn merge(&mut self, other: ChartOutcome) {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
        self.skipped.extend(other.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_lookup() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".to_string(), "b".to_string()],
            values: vec![vec![Some(1.0), Some(0.5)], vec![Some(0.5), Some(1.0)]],
        };
        assert_eq!(matrix.get("a", "b"), Some(0.5));
        assert_eq!(matrix.get("a", "missing"), None);
    }

    #[test]
    fn test_fill_value_display() {
        assert_eq!(FillValue::Numeric(2.5).to_string(), "2.5000");
        assert_eq!(FillValue::Text("A".to_string()).to_string(), "'A'");
    }

    #[test]
    fn test_chart_outcome_merge() {
        let mut outcome = ChartOutcome {
            written: vec!["a.png".to_string()],
            ..Default::default()
        };
        outcome.merge(ChartOutcome {
            written: vec!["b.png".to_string()],
            skipped: vec!["c.png".to_string()],
            failed: Vec::new(),
        });
        assert_eq!(outcome.written.len(), 2);
        assert_eq!(outcome.skipped, vec!["c.png".to_string()]);
    }
}
