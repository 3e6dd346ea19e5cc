//! Configuration for model fitting, forecasting and evaluation.
//!
//! Defaults reproduce the fixed analysis: SARIMA(1,1,1)(1,1,1,52), a
//! 12-week horizon with 95% bounds, a 12-week holdout and 40 ACF lags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-seasonal order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl SarimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for SarimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// No seasonal component.
    pub const fn none() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::new(1, 1, 1, 52)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// Which aggregate series the holdout evaluation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSeries {
    /// Every store's weekly series concatenated, store after store.
    #[default]
    Stacked,
    /// Weekly total across all stores.
    ChainTotal,
}

impl EvaluationSeries {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stacked => "stacked",
            Self::ChainTotal => "chain_total",
        }
    }
}

/// Configuration for the forecasting stages.
///
/// # Example
///
/// ```rust,ignore
/// use sales_forecast::config::{ForecastConfig, EvaluationSeries};
///
/// let config = ForecastConfig::builder()
///     .horizon(8)
///     .evaluation_series(EvaluationSeries::ChainTotal)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Non-seasonal order.
    /// Default: (1,1,1)
    pub order: SarimaOrder,

    /// Seasonal order.
    /// Default: (1,1,1,52)
    pub seasonal: SeasonalOrder,

    /// Number of weeks forecast for each store.
    /// Default: 12
    pub horizon: usize,

    /// Confidence level of the forecast bounds.
    /// Default: 0.95
    pub confidence: f64,

    /// Observations held out for evaluation.
    /// Default: 12
    pub holdout: usize,

    /// Series used for the holdout evaluation.
    /// Default: Stacked
    pub evaluation_series: EvaluationSeries,

    /// Lags shown in the residual autocorrelation chart.
    /// Default: 40
    pub acf_lags: usize,

    /// Lags used by the Ljung-Box test.
    /// Default: 10
    pub ljung_box_lags: usize,

    /// Constrain per-store fits to stationary and invertible coefficients.
    /// Default: false
    pub enforce_store_constraints: bool,

    /// Constrain the evaluation fit to stationary and invertible coefficients.
    /// Default: true
    pub enforce_evaluation_constraints: bool,

    /// Iteration cap for each Nelder-Mead run.
    /// Default: 1000
    pub max_iterations: usize,

    /// Whether to render forecast, evaluation and residual charts.
    /// Default: true
    pub generate_charts: bool,

    /// Chart size in pixels (width, height).
    /// Default: (1200, 600)
    pub chart_size: (u32, u32),
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            order: SarimaOrder::default(),
            seasonal: SeasonalOrder::default(),
            horizon: 12,
            confidence: 0.95,
            holdout: 12,
            evaluation_series: EvaluationSeries::default(),
            acf_lags: 40,
            ljung_box_lags: 10,
            enforce_store_constraints: false,
            enforce_evaluation_constraints: true,
            max_iterations: 1000,
            generate_charts: true,
            chart_size: (1200, 600),
        }
    }
}

impl ForecastConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ForecastConfigBuilder {
        ForecastConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.horizon == 0 {
            return Err(ConfigValidationError::InvalidHorizon);
        }

        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigValidationError::InvalidConfidence(self.confidence));
        }

        if self.holdout == 0 {
            return Err(ConfigValidationError::InvalidHoldout);
        }

        if self.seasonal.is_active() && self.seasonal.period < 2 {
            return Err(ConfigValidationError::InvalidSeasonalPeriod(
                self.seasonal.period,
            ));
        }

        if self.acf_lags == 0 || self.ljung_box_lags == 0 {
            return Err(ConfigValidationError::InvalidLags);
        }

        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidIterations);
        }

        let (width, height) = self.chart_size;
        if width < 100 || height < 100 {
            return Err(ConfigValidationError::InvalidChartSize { width, height });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Forecast horizon must be at least 1")]
    InvalidHorizon,

    #[error("Invalid confidence level: {0} (must be between 0.0 and 1.0, exclusive)")]
    InvalidConfidence(f64),

    #[error("Holdout length must be at least 1")]
    InvalidHoldout,

    #[error("Invalid seasonal period: {0} (must be at least 2 when seasonal terms are set)")]
    InvalidSeasonalPeriod(usize),

    #[error("ACF and Ljung-Box lags must be at least 1")]
    InvalidLags,

    #[error("Optimizer iteration cap must be at least 1")]
    InvalidIterations,

    #[error("Invalid chart size {width}x{height} (each side must be at least 100px)")]
    InvalidChartSize { width: u32, height: u32 },
}

/// Builder for [`ForecastConfig`].
#[derive(Debug, Default)]
pub struct ForecastConfigBuilder {
    order: Option<SarimaOrder>,
    seasonal: Option<SeasonalOrder>,
    horizon: Option<usize>,
    confidence: Option<f64>,
    holdout: Option<usize>,
    evaluation_series: Option<EvaluationSeries>,
    acf_lags: Option<usize>,
    ljung_box_lags: Option<usize>,
    enforce_store_constraints: Option<bool>,
    enforce_evaluation_constraints: Option<bool>,
    max_iterations: Option<usize>,
    generate_charts: Option<bool>,
    chart_size: Option<(u32, u32)>,
}

impl ForecastConfigBuilder {
    pub fn order(mut self, order: SarimaOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn seasonal(mut self, seasonal: SeasonalOrder) -> Self {
        self.seasonal = Some(seasonal);
        self
    }

    pub fn horizon(mut self, weeks: usize) -> Self {
        self.horizon = Some(weeks);
        self
    }

    pub fn confidence(mut self, level: f64) -> Self {
        self.confidence = Some(level);
        self
    }

    pub fn holdout(mut self, weeks: usize) -> Self {
        self.holdout = Some(weeks);
        self
    }

    pub fn evaluation_series(mut self, series: EvaluationSeries) -> Self {
        self.evaluation_series = Some(series);
        self
    }

    pub fn acf_lags(mut self, lags: usize) -> Self {
        self.acf_lags = Some(lags);
        self
    }

    pub fn ljung_box_lags(mut self, lags: usize) -> Self {
        self.ljung_box_lags = Some(lags);
        self
    }

    pub fn enforce_store_constraints(mut self, enabled: bool) -> Self {
        self.enforce_store_constraints = Some(enabled);
        self
    }

    pub fn enforce_evaluation_constraints(mut self, enabled: bool) -> Self {
        self.enforce_evaluation_constraints = Some(enabled);
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn generate_charts(mut self, enabled: bool) -> Self {
        self.generate_charts = Some(enabled);
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_size = Some((width, height));
        self
    }

    /// Build the configuration, validating all values.
    pub fn build(self) -> Result<ForecastConfig, ConfigValidationError> {
        let defaults = ForecastConfig::default();

        let config = ForecastConfig {
            order: self.order.unwrap_or(defaults.order),
            seasonal: self.seasonal.unwrap_or(defaults.seasonal),
            horizon: self.horizon.unwrap_or(defaults.horizon),
            confidence: self.confidence.unwrap_or(defaults.confidence),
            holdout: self.holdout.unwrap_or(defaults.holdout),
            evaluation_series: self
                .evaluation_series
                .unwrap_or(defaults.evaluation_series),
            acf_lags: self.acf_lags.unwrap_or(defaults.acf_lags),
            ljung_box_lags: self.ljung_box_lags.unwrap_or(defaults.ljung_box_lags),
            enforce_store_constraints: self
                .enforce_store_constraints
                .unwrap_or(defaults.enforce_store_constraints),
            enforce_evaluation_constraints: self
                .enforce_evaluation_constraints
                .unwrap_or(defaults.enforce_evaluation_constraints),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            generate_charts: self.generate_charts.unwrap_or(defaults.generate_charts),
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
        let config = ForecastConfig::default();
        assert_eq!(config.order, SarimaOrder::new(1, 1, 1));
        assert_eq!(config.seasonal, SeasonalOrder::new(1, 1, 1, 52));
        assert_eq!(config.horizon, 12);
        assert_eq!(config.holdout, 12);
        assert_eq!(config.acf_lags, 40);
        assert_eq!(config.evaluation_series, EvaluationSeries::Stacked);
        assert!(!config.enforce_store_constraints);
        assert!(config.enforce_evaluation_constraints);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_order_display() {
        assert_eq!(SarimaOrder::default().to_string(), "(1,1,1)");
        assert_eq!(SeasonalOrder::default().to_string(), "(1,1,1,52)");
    }

    #[test]
    fn test_invalid_confidence() {
        for level in [0.0, 1.0, 1.5, f64::NAN] {
            let result = ForecastConfig::builder().confidence(level).build();
            assert!(matches!(result, Err(ConfigValidationError::InvalidConfidence(_))));
        }
    }

    #[test]
    fn test_seasonal_period_required_with_seasonal_terms() {
        let result = ForecastConfig::builder()
            .seasonal(SeasonalOrder::new(1, 0, 0, 1))
            .build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidSeasonalPeriod(1))
        ));

        let config = ForecastConfig::builder()
            .seasonal(SeasonalOrder::none())
            .build()
            .unwrap();
        assert!(!config.seasonal.is_active());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let result = ForecastConfig::builder().horizon(0).build();
        assert!(matches!(result, Err(ConfigValidationError::InvalidHorizon)));
    }

    #[test]
    fn test_evaluation_series_serde() {
        let json = serde_json::to_string(&EvaluationSeries::ChainTotal).unwrap();
        assert_eq!(json, "\"chain_total\"");
        let config = ForecastConfig::default();
        let restored: ForecastConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(restored.seasonal, config.seasonal);
    }
}
