//! Describe table and correlation statistics.

use crate::error::Result;
use crate::types::{CorrelationMatrix, NumericSummary};
use crate::utils::{column_f64, mean, numeric_column_names, quantile_sorted, sample_std, sorted_finite};
use polars::prelude::*;

/// Describe every numeric column: count, mean, sample std, min, quartiles, max.
///
/// Quartiles use linear interpolation between closest ranks. Columns without
/// a single non-null value are left out.
pub fn describe_numeric(df: &DataFrame) -> Result<Vec<NumericSummary>> {
    let mut summaries = Vec::new();

    for name in numeric_column_names(df) {
        let values: Vec<f64> = column_f64(df, &name)?.into_iter().flatten().collect();
        if let Some(summary) = summarize(&name, &values) {
            summaries.push(summary);
        }
    }

    Ok(summaries)
}

fn summarize(name: &str, values: &[f64]) -> Option<NumericSummary> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return None;
    }

    Some(NumericSummary {
        column: name.to_string(),
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_std(&sorted).unwrap_or(f64::NAN),
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

/// Pearson correlation over pairwise-complete observations.
///
/// Returns `None` when fewer than two complete pairs exist or either side
/// has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Correlation matrix over all numeric columns of the frame.
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let columns = numeric_column_names(df);
    let data = columns
        .iter()
        .map(|name| column_f64(df, name))
        .collect::<PolarsResult<Vec<_>>>()?;

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}
