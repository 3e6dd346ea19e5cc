//! Configuration types for loading, cleaning and charting the sales dataset.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the cleaned dataset written into the output directory.
pub const CLEANED_FILE_NAME: &str = "Walmart_Cleaned_DataSet.csv";

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumericImputation {
    /// Use the mean of non-null values
    #[default]
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use a constant value (0.0)
    Zero,
}

impl NumericImputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Zero => "zero",
        }
    }
}

/// Strategy for imputing missing categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CategoricalImputation {
    /// Use the most frequent value (mode)
    #[default]
    Mode,
    /// Use the configured constant value
    Constant,
}

impl CategoricalImputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Constant => "constant",
        }
    }
}

/// Configuration for the processing stages.
///
/// Use [`ProcessingConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_processing::config::{ProcessingConfig, NumericImputation};
///
/// let config = ProcessingConfig::builder()
///     .numeric_imputation(NumericImputation::Median)
///     .generate_charts(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Strategy for imputing missing numeric values.
    /// Default: Mean
    pub numeric_imputation: NumericImputation,

    /// Strategy for imputing missing categorical values.
    /// Default: Mode
    pub categorical_imputation: CategoricalImputation,

    /// Fill value used by [`CategoricalImputation::Constant`].
    /// Default: "Unknown"
    pub categorical_fill_value: String,

    /// Whether to remove fully duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Output directory for the cleaned dataset and charts.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Whether to write the cleaned dataset to disk.
    /// Default: true
    pub save_cleaned: bool,

    /// Whether to render the exploratory charts.
    /// Default: true
    pub generate_charts: bool,

    /// Number of bins in the sales distribution histogram.
    /// Default: 30
    pub histogram_bins: usize,

    /// Chart size in pixels (width, height).
    /// Default: (1200, 600)
    pub chart_size: (u32, u32),
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            numeric_imputation: NumericImputation::default(),
            categorical_imputation: CategoricalImputation::default(),
            categorical_fill_value: "Unknown".to_string(),
            remove_duplicates: true,
            output_dir: PathBuf::from("outputs"),
            save_cleaned: true,
            generate_charts: true,
            histogram_bins: 30,
            chart_size: (1200, 600),
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Path of the cleaned dataset inside the output directory.
    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(CLEANED_FILE_NAME)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidBins(self.histogram_bins));
        }

        let (width, height) = self.chart_size;
        if width < 100 || height < 100 {
            return Err(ConfigValidationError::InvalidChartSize { width, height });
        }

        if self.categorical_imputation == CategoricalImputation::Constant
            && self.categorical_fill_value.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyFillValue);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid histogram bins: {0} (must be at least 1)")]
    InvalidBins(usize),

    #[error("Invalid chart size {width}x{height} (each side must be at least 100px)")]
    InvalidChartSize { width: u32, height: u32 },

    #[error("Constant categorical imputation requires a non-empty fill value")]
    EmptyFillValue,
}

/// Builder for [`ProcessingConfig`].
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    numeric_imputation: Option<NumericImputation>,
    categorical_imputation: Option<CategoricalImputation>,
    categorical_fill_value: Option<String>,
    remove_duplicates: Option<bool>,
    output_dir: Option<PathBuf>,
    save_cleaned: Option<bool>,
    generate_charts: Option<bool>,
    histogram_bins: Option<usize>,
    chart_size: Option<(u32, u32)>,
}

impl ProcessingConfigBuilder {
    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    pub fn categorical_imputation(mut self, strategy: CategoricalImputation) -> Self {
        self.categorical_imputation = Some(strategy);
        self
    }

    pub fn categorical_fill_value(mut self, value: impl Into<String>) -> Self {
        self.categorical_fill_value = Some(value.into());
        self
    }

    pub fn remove_duplicates(mut self, enabled: bool) -> Self {
        self.remove_duplicates = Some(enabled);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn save_cleaned(mut self, enabled: bool) -> Self {
        self.save_cleaned = Some(enabled);
        self
    }

    pub fn generate_charts(mut self, enabled: bool) -> Self {
        self.generate_charts = Some(enabled);
        self
    }

    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = Some((width, height));
        self
    }

    /// Build the configuration, validating all values.
    pub fn build(self) -> Result<ProcessingConfig, ConfigValidationError> {
        let defaults = ProcessingConfig::default();

        let config = ProcessingConfig {
            numeric_imputation: self
                .numeric_imputation
                .unwrap_or(defaults.numeric_imputation),
            categorical_imputation: self
                .categorical_imputation
                .unwrap_or(defaults.categorical_imputation),
            categorical_fill_value: self
                .categorical_fill_value
                .unwrap_or(defaults.categorical_fill_value),
            remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            save_cleaned: self.save_cleaned.unwrap_or(defaults.save_cleaned),
            generate_charts: self.generate_charts.unwrap_or(defaults.generate_charts),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            chart_size: self.chart_size.unwrap_or(defaults.chart_size),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.numeric_imputation, NumericImputation::Mean);
        assert_eq!(config.categorical_imputation, CategoricalImputation::Mode);
        assert!(config.remove_duplicates);
        assert_eq!(config.histogram_bins, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ProcessingConfig::builder()
            .numeric_imputation(NumericImputation::Median)
            .generate_charts(false)
            .output_dir("/tmp/sales")
            .build()
            .unwrap();

        assert_eq!(config.numeric_imputation, NumericImputation::Median);
        assert!(!config.generate_charts);
        assert_eq!(
            config.cleaned_path(),
            PathBuf::from("/tmp/sales").join(CLEANED_FILE_NAME)
        );
    }

    #[test]
    fn test_invalid_bins() {
        let result = ProcessingConfig::builder().histogram_bins(0).build();
        assert!(matches!(result, Err(ConfigValidationError::InvalidBins(0))));
    }

    #[test]
    fn test_invalid_chart_size() {
        let result = ProcessingConfig::builder().chart_size(50, 600).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_constant_fill_rejected() {
        let result = ProcessingConfig::builder()
            .categorical_imputation(CategoricalImputation::Constant)
            .categorical_fill_value("  ")
            .build();
        assert!(matches!(result, Err(ConfigValidationError::EmptyFillValue)));
    }

    #[test]
    fn test_config_serde() {
        let config = ProcessingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: ProcessingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.histogram_bins, config.histogram_bins);
        assert_eq!(restored.numeric_imputation, config.numeric_imputation);
    }
}
