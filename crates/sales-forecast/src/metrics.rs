//! Forecast accuracy metrics.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// MAE, MSE, RMSE and MAPE of a forecast against held-out actuals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub mse: f64,
    /// Always exactly `mse.sqrt()`.
    pub rmse: f64,
    /// Mean absolute percentage error in percent, over points whose actual
    /// value is non-zero. `None` when every actual is zero.
    pub mape: Option<f64>,
    pub n: usize,
}

impl AccuracyMetrics {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ForecastError::InvalidSeries(format!(
                "{} actual values but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let n = actual.len() as f64;
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;

        let percentages: Vec<f64> = actual
            .iter()
            .zip(&errors)
            .filter(|(a, _)| **a != 0.0)
            .map(|(a, e)| (e / a).abs())
            .collect();
        let mape = if percentages.is_empty() {
            None
        } else {
            Some(percentages.iter().sum::<f64>() / percentages.len() as f64 * 100.0)
        };

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            mape,
            n: actual.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_values() {
        let metrics = AccuracyMetrics::compute(&[100.0, 200.0, 300.0], &[110.0, 190.0, 330.0]).unwrap();
        assert!((metrics.mae - 50.0 / 3.0).abs() < 1e-12);
        assert!((metrics.mse - 1100.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.rmse, metrics.mse.sqrt());
        let expected_mape = (0.1 + 0.05 + 0.1) / 3.0 * 100.0;
        assert!((metrics.mape.unwrap() - expected_mape).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_forecast() {
        let metrics = AccuracyMetrics::compute(&[1.0, 2.0], &[1.0, 2.0]).unwrap();
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, Some(0.0));
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let metrics = AccuracyMetrics::compute(&[0.0, 10.0], &[5.0, 12.0]).unwrap();
        assert!((metrics.mape.unwrap() - 20.0).abs() < 1e-9);

        let all_zero = AccuracyMetrics::compute(&[0.0, 0.0], &[1.0, -1.0]).unwrap();
        assert_eq!(all_zero.mape, None);
        assert_eq!(all_zero.mae, 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(AccuracyMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(AccuracyMetrics::compute(&[], &[]).is_err());
    }
}
