//! Seasonal ARIMA estimated by conditional sum of squares.
//!
//! The series is differenced by `(1 - B)^d (1 - B^s)^D`; the multiplicative
//! ARMA part is fitted to the differenced values with zero pre-sample values,
//! minimizing the residual sum of squares with Nelder-Mead. Forecasts run the
//! ARMA recursion forward and integrate back through the differencing
//! polynomial.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_forecast::model::{Sarima, SarimaSpec};
//! use sales_forecast::config::{SarimaOrder, SeasonalOrder};
//!
//! let spec = SarimaSpec::new(SarimaOrder::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 52));
//! let fit = Sarima::new(spec).fit(&weekly_sales)?;
//! let forecast = fit.forecast(12, 0.95)?;
//! println!("AIC {:.1}, next week {:.0}", fit.aic, forecast.mean[0]);
//! ```

mod optimizer;
mod polynomial;

pub use optimizer::{Minimum, NelderMead};
pub use polynomial::{
    LagPolynomial, autoregressive, constrain_stationary, differencing, moving_average,
    psi_weights,
};

use crate::config::{ForecastConfig, SarimaOrder, SeasonalOrder};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use tracing::debug;

// ============================================================================
// Model Definition
// ============================================================================

/// Model orders plus the coefficient constraints to apply while fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaSpec {
    pub order: SarimaOrder,
    pub seasonal: SeasonalOrder,
    pub enforce_stationarity: bool,
    pub enforce_invertibility: bool,
}

impl SarimaSpec {
    pub fn new(order: SarimaOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal,
            enforce_stationarity: false,
            enforce_invertibility: false,
        }
    }

    pub fn with_enforcement(mut self, stationarity: bool, invertibility: bool) -> Self {
        self.enforce_stationarity = stationarity;
        self.enforce_invertibility = invertibility;
        self
    }

    /// Number of ARMA coefficients (σ² not included).
    pub fn n_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Observations consumed by differencing.
    pub fn differencing_span(&self) -> usize {
        self.order.d + self.seasonal.d * self.period()
    }

    /// Shortest series [`Sarima::fit`] accepts.
    pub fn min_observations(&self) -> usize {
        self.differencing_span() + self.n_params() + 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.seasonal.is_active() && self.seasonal.period < 2 {
            return Err(ForecastError::InvalidOrder(format!(
                "seasonal order {} needs a period of at least 2",
                self.seasonal
            )));
        }
        Ok(())
    }

    fn period(&self) -> usize {
        if self.seasonal.is_active() {
            self.seasonal.period
        } else {
            0
        }
    }
}

impl Default for SarimaSpec {
    fn default() -> Self {
        Self::new(SarimaOrder::default(), SeasonalOrder::default())
    }
}

// ============================================================================
// Coefficients
// ============================================================================

/// Estimated ARMA coefficients, in the sign convention
/// `(1 - φB)(1 - ΦB^s) w_t = (1 + θB)(1 + ΘB^s) e_t`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SarimaCoefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaCoefficients {
    /// Split an optimizer vector into coefficient groups, constraining each
    /// group when `SarimaSpec` enforces it.
    fn from_vector(spec: &SarimaSpec, x: &[f64]) -> Self {
        let (ar, rest) = x.split_at(spec.order.p);
        let (ma, rest) = rest.split_at(spec.order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(spec.seasonal.p);

        let stationary = |values: &[f64]| {
            if spec.enforce_stationarity {
                constrain_stationary(values)
            } else {
                values.to_vec()
            }
        };
        let invertible = |values: &[f64]| {
            if spec.enforce_invertibility {
                constrain_stationary(values).into_iter().map(|v| -v).collect()
            } else {
                values.to_vec()
            }
        };

        Self {
            ar: stationary(ar),
            ma: invertible(ma),
            seasonal_ar: stationary(seasonal_ar),
            seasonal_ma: invertible(seasonal_ma),
        }
    }

    fn ar_polynomial(&self, period: usize) -> LagPolynomial {
        autoregressive(&self.ar, &self.seasonal_ar, period)
    }

    fn ma_polynomial(&self, period: usize) -> LagPolynomial {
        moving_average(&self.ma, &self.seasonal_ma, period)
    }
}

/// One-step residuals of the ARMA part with zero pre-sample values.
fn css_residuals(w: &[f64], ar: &LagPolynomial, ma: &LagPolynomial) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut value = w[t];
        for &(lag, c) in ar.terms() {
            if lag > t {
                break;
            }
            value += c * w[t - lag];
        }
        for &(lag, c) in ma.terms() {
            if lag > t {
                break;
            }
            value -= c * e[t - lag];
        }
        e[t] = value;
    }
    e
}

// ============================================================================
// Estimation
// ============================================================================

/// Seasonal ARIMA estimator.
#[derive(Debug, Clone)]
pub struct Sarima {
    spec: SarimaSpec,
    max_iterations: usize,
}

impl Sarima {
    pub fn new(spec: SarimaSpec) -> Self {
        Self {
            spec,
            max_iterations: 1000,
        }
    }

    /// Estimator for the configured orders; `enforce` applies both
    /// stationarity and invertibility constraints.
    pub fn from_config(config: &ForecastConfig, enforce: bool) -> Self {
        let spec = SarimaSpec::new(config.order, config.seasonal).with_enforcement(enforce, enforce);
        Self::new(spec).with_max_iterations(config.max_iterations)
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations.max(1);
        self
    }

    pub fn spec(&self) -> &SarimaSpec {
        &self.spec
    }

    pub fn fit(&self, y: &[f64]) -> Result<FittedSarima> {
        let spec = self.spec;
        spec.validate()?;

        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries(format!(
                "non-finite value at position {}",
                i
            )));
        }
        let required = spec.min_observations();
        if y.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: y.len(),
            });
        }

        let period = spec.period();
        let w = differencing(spec.order.d, spec.seasonal.d, period).apply(y);

        let objective = |x: &[f64]| {
            let coefficients = SarimaCoefficients::from_vector(&spec, x);
            css_residuals(
                &w,
                &coefficients.ar_polynomial(period),
                &coefficients.ma_polynomial(period),
            )
            .iter()
            .map(|e| e * e)
            .sum::<f64>()
        };
        let start = vec![0.0; spec.n_params()];
        let minimum = NelderMead::new(self.max_iterations).minimize_with_restart(objective, &start);
        if minimum.value == f64::MAX {
            return Err(ForecastError::OptimizationFailed(format!(
                "no finite sum of squares for SARIMA{}{}",
                spec.order, spec.seasonal
            )));
        }

        let coefficients = SarimaCoefficients::from_vector(&spec, &minimum.point);
        let residuals = css_residuals(
            &w,
            &coefficients.ar_polynomial(period),
            &coefficients.ma_polynomial(period),
        );

        let n = w.len() as f64;
        let css: f64 = residuals.iter().map(|e| e * e).sum();
        let sigma2 = (css / n).max(f64::MIN_POSITIVE);
        let log_likelihood = -n / 2.0 * ((2.0 * PI * sigma2).ln() + 1.0);
        let k = (spec.n_params() + 1) as f64;

        debug!(
            "SARIMA{}{} fitted on {} observations: sigma2 = {:.4}, {} iterations",
            spec.order,
            spec.seasonal,
            w.len(),
            sigma2,
            minimum.iterations
        );

        Ok(FittedSarima {
            spec,
            coefficients,
            sigma2,
            log_likelihood,
            aic: 2.0 * k - 2.0 * log_likelihood,
            bic: k * n.ln() - 2.0 * log_likelihood,
            n_obs: w.len(),
            converged: minimum.converged,
            iterations: minimum.iterations,
            residuals,
            history: y.to_vec(),
            differenced: w,
        })
    }
}

// ============================================================================
// Fitted Model
// ============================================================================

/// A fitted model, holding the data needed to forecast from the series end.
#[derive(Debug, Clone)]
pub struct FittedSarima {
    pub spec: SarimaSpec,
    pub coefficients: SarimaCoefficients,
    /// Innovation variance, CSS / n_obs.
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Observations after differencing.
    pub n_obs: usize,
    pub converged: bool,
    pub iterations: usize,
    /// Residuals on the differenced scale.
    pub residuals: Vec<f64>,
    history: Vec<f64>,
    differenced: Vec<f64>,
}

/// Point forecasts with symmetric normal bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub confidence: f64,
}

impl ForecastOutput {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Serializable description of a fit, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub order: SarimaOrder,
    pub seasonal: SeasonalOrder,
    pub enforce_constraints: bool,
    pub coefficients: SarimaCoefficients,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_obs: usize,
    pub converged: bool,
    pub iterations: usize,
}

impl FittedSarima {
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            order: self.spec.order,
            seasonal: self.spec.seasonal,
            enforce_constraints: self.spec.enforce_stationarity || self.spec.enforce_invertibility,
            coefficients: self.coefficients.clone(),
            sigma2: self.sigma2,
            log_likelihood: self.log_likelihood,
            aic: self.aic,
            bic: self.bic,
            n_obs: self.n_obs,
            converged: self.converged,
            iterations: self.iterations,
        }
    }

    /// Forecast `steps` periods past the end of the fitted series.
    ///
    /// Future shocks are zero; the standard error at horizon `h` is
    /// `σ * sqrt(ψ0² + ... + ψ(h-1)²)` with ψ the weights of
    /// `θ(B)Θ(B^s) / (φ(B)Φ(B^s)(1 - B)^d(1 - B^s)^D)`.
    pub fn forecast(&self, steps: usize, confidence: f64) -> Result<ForecastOutput> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ForecastError::InvalidConfig(format!(
                "confidence level {} is outside (0, 1)",
                confidence
            )));
        }

        let period = self.spec.period();
        let ar = self.coefficients.ar_polynomial(period);
        let ma = self.coefficients.ma_polynomial(period);
        let delta = differencing(self.spec.order.d, self.spec.seasonal.d, period);

        let n = self.differenced.len();
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        for t in n..n + steps {
            let mut value = 0.0;
            for &(lag, c) in ar.terms() {
                if lag > t {
                    break;
                }
                value -= c * w[t - lag];
            }
            for &(lag, c) in ma.terms() {
                if lag > t {
                    break;
                }
                value += c * e[t - lag];
            }
            w.push(value);
            e.push(0.0);
        }

        let mut y = self.history.clone();
        let start = y.len();
        for h in 0..steps {
            let t = start + h;
            let mut value = w[n + h];
            for &(lag, c) in delta.terms() {
                if lag > t {
                    break;
                }
                value -= c * y[t - lag];
            }
            y.push(value);
        }
        let mean = y.split_off(start);

        let psi = psi_weights(&ar.multiply(&delta), &ma, steps);
        let z = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidConfig(e.to_string()))?
            .inverse_cdf(0.5 + confidence / 2.0);

        let mut cumulative = 0.0;
        let std_errors: Vec<f64> = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        let lower = mean.iter().zip(&std_errors).map(|(m, s)| m - z * s).collect();
        let upper = mean.iter().zip(&std_errors).map(|(m, s)| m + z * s).collect();

        Ok(ForecastOutput {
            mean,
            lower,
            upper,
            std_errors,
            confidence,
        })
    }
}
