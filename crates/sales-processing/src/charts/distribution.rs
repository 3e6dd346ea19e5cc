//! Histogram with density overlay and box plot.

use super::{format_amount, no_data, padded_range, ChartSettings};
use crate::error::Result;
use crate::utils::{quantile_sorted, sample_std, sorted_finite};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Gaussian kernel density estimate evaluated at `grid`.
///
/// Bandwidth follows Scott's rule, `std * n^(-1/5)`. Returns zeros when the
/// sample has no spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let bandwidth = match sample_std(values) {
        Some(std) if std > 0.0 => std * n.powf(-0.2),
        _ => return vec![0.0; grid.len()],
    };
    let norm = 1.0 / (n * bandwidth * (2.0 * PI).sqrt());

    grid.iter()
        .map(|&x| {
            values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Equal-width bin counts over `[min, max]`; the last bin is closed.
pub(crate) fn bin_counts(sorted: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for &v in sorted {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (min, width, counts)
}

/// Histogram of `values` with a KDE curve scaled to counts.
pub fn histogram(
    path: &Path,
    settings: &ChartSettings,
    values: &[f64],
    bins: usize,
    color: RGBColor,
) -> Result<()> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() || bins == 0 {
        return Err(no_data(&settings.title));
    }

    let (min, width, counts) = bin_counts(&sorted, bins);
    let x_max = min + width * bins as f64;

    let grid: Vec<f64> = (0..=200)
        .map(|i| min + (x_max - min) * i as f64 / 200.0)
        .collect();
    let scale = sorted.len() as f64 * width;
    let density: Vec<(f64, f64)> = grid
        .iter()
        .zip(gaussian_kde(&sorted, &grid))
        .map(|(x, d)| (*x, d * scale))
        .collect();

    let peak = counts.iter().copied().max().unwrap_or(0) as f64;
    let y_max = density.iter().map(|p| p.1).fold(peak, f64::max) * 1.1;

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 26).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(min..x_max, 0.0..y_max.max(1.0))?;

    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|v| format_amount(*v))
        .x_desc(&settings.x_label)
        .y_desc(&settings.y_label)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
        let x0 = min + width * i as f64;
        Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], color.mix(0.6).filled())
    }))?;
    chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
        let x0 = min + width * i as f64;
        Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], color.stroke_width(1))
    }))?;
    chart.draw_series(LineSeries::new(density, color.stroke_width(2)))?;

    root.present()?;
    Ok(())
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence)
            .collect();
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers,
        })
    }
}

/// Single vertical box plot of `values`.
pub fn box_plot(
    path: &Path,
    settings: &ChartSettings,
    values: &[f64],
    color: RGBColor,
) -> Result<BoxStats> {
    let stats = BoxStats::from_values(values).ok_or_else(|| no_data(&settings.title))?;
    let (y_min, y_max) = padded_range(values.iter().copied()).ok_or_else(|| no_data(&settings.title))?;

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 26).into_font())
        .margin(15)
        .x_label_area_size(20)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(10)
        .y_label_formatter(&|v| format_amount(*v))
        .y_desc(&settings.y_label)
        .draw()?;

    let (left, right, mid) = (0.3, 0.7, 0.5);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        color.mix(0.7).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(left, stats.q1), (right, stats.q3)],
        BLACK.stroke_width(1),
    )))?;

    let segments = vec![
        vec![(left, stats.median), (right, stats.median)],
        vec![(mid, stats.q3), (mid, stats.upper_whisker)],
        vec![(mid, stats.q1), (mid, stats.lower_whisker)],
        vec![(0.4, stats.upper_whisker), (0.6, stats.upper_whisker)],
        vec![(0.4, stats.lower_whisker), (0.6, stats.lower_whisker)],
    ];
    chart.draw_series(
        segments
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
    )?;
    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|&v| Circle::new((mid, v), 3, BLACK.stroke_width(1))),
    )?;

    root.present()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kde_integrates_to_one() {
        let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        let grid: Vec<f64> = (0..=2000).map(|i| -40.0 + i as f64 * 0.04).collect();
        let density = gaussian_kde(&values, &grid);
        let area: f64 = density.iter().sum::<f64>() * 0.04;
        assert!((area - 1.0).abs() < 0.01, "area = {}", area);
    }

    #[test]
    fn test_kde_constant_sample() {
        assert_eq!(gaussian_kde(&[3.0, 3.0], &[1.0, 2.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_bin_counts_cover_all_values() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0, 10.0];
        let (min, width, counts) = bin_counts(&sorted, 5);
        assert_eq!(min, 0.0);
        assert_eq!(width, 2.0);
        assert_eq!(counts.iter().sum::<usize>(), 5);
        assert_eq!(counts[4], 1);
    }

    #[test]
    fn test_box_stats_outliers() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let stats = BoxStats::from_values(&values).unwrap();
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
