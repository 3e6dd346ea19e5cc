//! Error types for model fitting, forecasting and the analysis run.

use sales_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the forecasting crate.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// The series is too short for the requested model.
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The series holds values the model cannot use.
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// A model order that cannot be estimated.
    #[error("Invalid model order: {0}")]
    InvalidOrder(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The optimizer produced no finite objective value.
    #[error("Optimization failed: {0}")]
    OptimizationFailed(String),

    /// Error raised while loading, cleaning or charting the data.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ForecastError>,
    },
}

impl ForecastError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ForecastError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used in the JSON report.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::InvalidSeries(_) => "INVALID_SERIES",
            Self::InvalidOrder(_) => "INVALID_ORDER",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::OptimizationFailed(_) => "OPTIMIZATION_FAILED",
            Self::Processing(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Chart failures are recorded rather than aborting the run.
    pub fn is_chart_failure(&self) -> bool {
        match self {
            Self::Processing(e) => e.is_chart_failure(),
            Self::WithContext { source, .. } => source.is_chart_failure(),
            _ => false,
        }
    }
}

impl Serialize for ForecastError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ForecastError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, ProcessingError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ForecastError::Processing(e).with_context(context))
    }
}
