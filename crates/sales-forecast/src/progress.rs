//! Progress reporting for the analysis run.
//!
//! Each stage owns a slice of the 0.0 - 1.0 range; updates inside a stage
//! land proportionally within that slice. Per-store fitting reports one
//! update per store.
//!
//! ```rust,ignore
//! let pipeline = AnalysisPipeline::builder()
//!     .on_progress(|update| eprintln!("{:>5.1}% {}", update.progress * 100.0, update.message))
//!     .build()?;
//! ```

use sales_processing::StoreId;
use serde::{Deserialize, Serialize};

/// Stages of the analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Reading the CSV file
    Loading,
    /// Shape, dtypes, missing values, describe table
    Profiling,
    /// Imputation and deduplication
    Cleaning,
    /// Exploratory charts and insights
    Visualizing,
    /// Grouping sales into weekly per-store series
    Aggregating,
    /// Fitting one model per store
    Forecasting,
    /// Holdout evaluation
    Evaluating,
    /// Residual checks
    Diagnostics,
    /// Writing the JSON report
    Reporting,
    Complete,
    Failed,
}

/// Working stages with their share of the run. Fitting dominates.
const STAGE_SHARES: [(AnalysisStage, f32); 9] = [
    (AnalysisStage::Loading, 0.05),
    (AnalysisStage::Profiling, 0.05),
    (AnalysisStage::Cleaning, 0.10),
    (AnalysisStage::Visualizing, 0.15),
    (AnalysisStage::Aggregating, 0.05),
    (AnalysisStage::Forecasting, 0.40),
    (AnalysisStage::Evaluating, 0.10),
    (AnalysisStage::Diagnostics, 0.05),
    (AnalysisStage::Reporting, 0.05),
];

impl AnalysisStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Profiling => "Profiling Sales",
            Self::Cleaning => "Cleaning Rows",
            Self::Visualizing => "Rendering Charts",
            Self::Aggregating => "Aggregating Weekly Sales",
            Self::Forecasting => "Forecasting Stores",
            Self::Evaluating => "Evaluating Holdout",
            Self::Diagnostics => "Checking Residuals",
            Self::Reporting => "Writing Report",
            Self::Complete => "Done",
            Self::Failed => "Aborted",
        }
    }

    /// `(start, end)` of the stage within the overall run. `Complete` sits at
    /// 1.0 and `Failed` at 0.0, both with zero width.
    pub fn span(&self) -> (f32, f32) {
        match self {
            Self::Complete => return (1.0, 1.0),
            Self::Failed => return (0.0, 0.0),
            _ => {}
        }
        let mut start = 0.0;
        for (stage, share) in STAGE_SHARES {
            if stage == *self {
                return (start, start + share);
            }
            start += share;
        }
        (start, start)
    }
}

/// `done` of `total` units of work within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCount {
    pub done: usize,
    pub total: usize,
}

impl StepCount {
    fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,
    /// Overall fraction of the run, 0.0 - 1.0
    pub progress: f32,
    pub message: String,
    /// Store being fitted, for per-store updates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<StepCount>,
}

impl ProgressUpdate {
    /// Update at `fraction` of the way through `stage`.
    pub fn new(stage: AnalysisStage, fraction: f32, message: impl Into<String>) -> Self {
        let (start, end) = stage.span();
        let fraction = fraction.clamp(0.0, 1.0);
        Self {
            stage,
            progress: (start + (end - start) * fraction).clamp(0.0, 1.0),
            message: message.into(),
            store: None,
            steps: None,
        }
    }

    /// Forecasting update after `done` of `total` stores, naming the store
    /// about to be fitted (if any).
    pub fn stores(
        store: Option<StoreId>,
        done: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let steps = StepCount { done, total };
        Self {
            store,
            steps: Some(steps),
            ..Self::new(AnalysisStage::Forecasting, steps.fraction(), message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Sink for progress updates. `Send + Sync` so a pipeline can move to a
/// worker thread.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Adapts any `Fn(ProgressUpdate)` into a [`ProgressReporter`].
pub struct ClosureProgressReporter<F> {
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update)
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_obj_safe!(ProgressReporter);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_stage_spans_tile_the_run() {
        let mut end = 0.0;
        for (stage, _) in STAGE_SHARES {
            let (start, stop) = stage.span();
            assert!((start - end).abs() < 1e-5, "{:?} starts at {}", stage, start);
            end = stop;
        }
        assert!((end - 1.0).abs() < 1e-5);
        assert_eq!(AnalysisStage::Complete.span(), (1.0, 1.0));
    }

    #[test]
    fn test_store_progress_within_forecasting() {
        let update = ProgressUpdate::stores(Some(7), 5, 10, "Fitting store 7");
        assert!((update.progress - 0.6).abs() < 1e-6);
        assert_eq!(update.store, Some(7));
        assert_eq!(update.steps, Some(StepCount { done: 5, total: 10 }));

        let empty = ProgressUpdate::stores(None, 0, 0, "No stores");
        assert!((empty.progress - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_closure_reporter_forwards_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().unwrap().push(update.stage);
        });
        reporter.report(ProgressUpdate::new(AnalysisStage::Loading, 0.0, "start"));
        reporter.report(ProgressUpdate::complete("done"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![AnalysisStage::Loading, AnalysisStage::Complete]
        );
    }

    #[test]
    fn test_plain_update_omits_store_fields() {
        let json =
            serde_json::to_string(&ProgressUpdate::new(AnalysisStage::Cleaning, 0.5, "Cleaning"))
                .unwrap();
        assert!(json.contains("\"cleaning\""));
        assert!(!json.contains("store"));
        assert!(!json.contains("steps"));
    }
}
