//! The JSON summary written at the end of an analysis run.

use crate::diagnostics::ResidualDiagnostics;
use crate::evaluation::EvaluationResult;
use crate::forecaster::{StoreFailure, StoreForecast};
use sales_processing::{
    ChartOutcome, CleaningReport, CorrelationMatrix, DatasetOverview, SalesInsights, StoreId,
    WeeklyGrouping,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const REPORT_FILE_NAME: &str = "analysis_report.json";

/// Shape of the weekly per-store series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub stores: usize,
    pub min_weeks: usize,
    pub max_weeks: usize,
    pub undated_rows: usize,
    pub storeless_rows: usize,
    pub filled_weeks: usize,
}

impl WeeklySummary {
    pub fn from_grouping(grouping: &WeeklyGrouping) -> Self {
        let lengths = grouping.series.iter().map(|s| s.len());
        Self {
            stores: grouping.series.len(),
            min_weeks: lengths.clone().min().unwrap_or(0),
            max_weeks: lengths.max().unwrap_or(0),
            undated_rows: grouping.undated_rows,
            storeless_rows: grouping.storeless_rows,
            filled_weeks: grouping.filled_weeks,
        }
    }
}

/// Everything an analysis run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// RFC 3339 local timestamp.
    pub generated_at: String,
    pub input_file: PathBuf,
    pub output_dir: PathBuf,

    pub overview: DatasetOverview,
    pub cleaning: CleaningReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_file: Option<PathBuf>,
    pub correlation: CorrelationMatrix,

    pub date_parse_failures: usize,
    /// Expected columns absent from the input.
    pub missing_columns: Vec<String>,
    pub insights: SalesInsights,

    pub weekly: WeeklySummary,
    pub forecasts: BTreeMap<StoreId, StoreForecast>,
    pub skipped_stores: Vec<StoreFailure>,

    pub evaluation: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_error: Option<String>,
    pub diagnostics: Option<ResidualDiagnostics>,

    pub charts: ChartOutcome,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl AnalysisReport {
    pub fn forecast_for(&self, store: StoreId) -> Option<&StoreForecast> {
        self.forecasts.get(&store)
    }
}
