//! Two-panel chart: a line on top, stems with a symmetric band below.

use super::{format_amount, no_data, padded_range, ChartSettings, BLUE};
use crate::error::Result;
use plotters::prelude::*;
use std::path::Path;

/// Draw `series` as a line in the upper half and `stems` (indexed from 0) as
/// vertical stems in the lower half, shading `±band` around zero.
///
/// Used for residual plots: residuals on top, their autocorrelation below.
pub fn line_and_stems(
    path: &Path,
    settings: &ChartSettings,
    lower_title: &str,
    series: &[f64],
    stems: &[f64],
    band: f64,
) -> Result<()> {
    let (y_min, y_max) =
        padded_range(series.iter().copied()).ok_or_else(|| no_data(&settings.title))?;
    if stems.is_empty() {
        return Err(no_data(lower_title));
    }

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically((settings.height / 2) as i32);

    let n = series.len() as f64;
    let mut top = ChartBuilder::on(&upper)
        .caption(&settings.title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..n.max(1.0), y_min..y_max)?;
    top.configure_mesh()
        .x_labels(10)
        .y_labels(6)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format_amount(*v))
        .draw()?;
    top.draw_series(LineSeries::new(
        series.iter().enumerate().map(|(i, v)| (i as f64, *v)),
        BLUE.stroke_width(1),
    ))?;

    let lags = stems.len() as f64;
    let stem_max = stems
        .iter()
        .map(|v| v.abs())
        .fold(band.abs(), f64::max)
        .max(1.0);
    let mut bottom = ChartBuilder::on(&lower)
        .caption(lower_title, ("sans-serif", 22).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..lags - 0.5, -stem_max * 1.1..stem_max * 1.1)?;
    bottom
        .configure_mesh()
        .x_labels(10)
        .y_labels(5)
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.2}", v))
        .draw()?;

    if band > 0.0 {
        bottom.draw_series(std::iter::once(Rectangle::new(
            [(-0.5, -band), (lags - 0.5, band)],
            BLUE.mix(0.15).filled(),
        )))?;
    }
    bottom.draw_series(std::iter::once(PathElement::new(
        vec![(-0.5, 0.0), (lags - 0.5, 0.0)],
        BLACK.stroke_width(1),
    )))?;
    bottom.draw_series(stems.iter().enumerate().map(|(lag, r)| {
        PathElement::new(vec![(lag as f64, 0.0), (lag as f64, *r)], BLUE.stroke_width(2))
    }))?;
    bottom.draw_series(
        stems
            .iter()
            .enumerate()
            .map(|(lag, r)| Circle::new((lag as f64, *r), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_stems_requires_stems() {
        let dir = tempfile::tempdir().unwrap();
        let err = line_and_stems(
            &dir.path().join("residuals.png"),
            &ChartSettings::new("Residuals"),
            "Autocorrelation",
            &[1.0, 2.0],
            &[],
            0.1,
        )
        .unwrap_err();
        assert!(err.is_chart_failure());
    }
}
