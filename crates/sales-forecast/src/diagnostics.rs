//! Residual diagnostics: autocorrelation, Ljung-Box and information criteria.

use crate::error::{ForecastError, Result};
use crate::model::FittedSarima;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::info;

/// Two-sided 95% normal quantile used for the ACF band.
const ACF_Z: f64 = 1.96;

/// Sample autocorrelation for lags `0..=lags` (capped at `n - 1`).
///
/// Uses the biased estimator `Σ (x_t - x̄)(x_{t+k} - x̄) / Σ (x_t - x̄)²`.
/// A constant series yields 1 at lag 0 and 0 elsewhere.
pub fn autocorrelation(x: &[f64], lags: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = lags.min(n - 1);
    let mean = x.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = x.iter().map(|v| v - mean).collect();
    let denominator: f64 = centered.iter().map(|v| v * v).sum();

    (0..=max_lag)
        .map(|k| {
            if k == 0 {
                return 1.0;
            }
            if denominator == 0.0 {
                return 0.0;
            }
            centered[..n - k]
                .iter()
                .zip(&centered[k..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denominator
        })
        .collect()
}

/// Half-width of the 95% band for white-noise autocorrelations.
pub fn acf_confidence_band(n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        ACF_Z / (n as f64).sqrt()
    }
}

/// Ljung-Box portmanteau test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LjungBox {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    pub degrees_of_freedom: usize,
}

/// `Q = n(n+2) Σ_{k=1..h} r_k² / (n-k)`, compared against χ² with
/// `h - fitted_params` degrees of freedom (at least 1).
pub fn ljung_box(residuals: &[f64], lags: usize, fitted_params: usize) -> Result<LjungBox> {
    let n = residuals.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData {
            required: 3,
            actual: n,
        });
    }
    let acf = autocorrelation(residuals, lags);
    let h = acf.len() - 1;
    let nf = n as f64;
    let statistic = nf
        * (nf + 2.0)
        * acf
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, r)| r * r / (nf - k as f64))
            .sum::<f64>();

    let degrees_of_freedom = h.saturating_sub(fitted_params).max(1);
    let chi2 = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| ForecastError::InvalidConfig(e.to_string()))?;

    Ok(LjungBox {
        statistic,
        p_value: 1.0 - chi2.cdf(statistic),
        lags: h,
        degrees_of_freedom,
    })
}

/// Residual checks for one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualDiagnostics {
    /// One-step residuals on the differenced scale, `n - d - sD` of them.
    pub residuals: Vec<f64>,
    pub acf: Vec<f64>,
    /// Half-width of the 95% white-noise band.
    pub confidence_band: f64,
    /// Lags (excluding 0) whose autocorrelation falls outside the band.
    pub significant_lags: Vec<usize>,
    pub aic: f64,
    pub bic: f64,
    pub ljung_box: Option<LjungBox>,
}

impl ResidualDiagnostics {
    pub fn from_fit(fit: &FittedSarima, acf_lags: usize, ljung_box_lags: usize) -> Self {
        let residuals = fit.residuals.clone();
        let acf = autocorrelation(&residuals, acf_lags);
        let confidence_band = acf_confidence_band(residuals.len());
        let significant_lags = acf
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, r)| r.abs() > confidence_band)
            .map(|(k, _)| k)
            .collect();
        let ljung_box = ljung_box(&residuals, ljung_box_lags, fit.spec.n_params()).ok();

        info!("AIC: {:.3}", fit.aic);
        info!("BIC: {:.3}", fit.bic);
        if let Some(test) = &ljung_box {
            info!(
                "Ljung-Box Q({}) = {:.3}, p-value = {:.4}",
                test.lags, test.statistic, test.p_value
            );
        }

        Self {
            residuals,
            acf,
            confidence_band,
            significant_lags,
            aic: fit.aic,
            bic: fit.bic,
            ljung_box,
        }
    }
}
