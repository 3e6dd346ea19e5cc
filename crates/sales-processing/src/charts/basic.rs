//! Line and categorical bar charts.

use super::{format_amount, no_data, padded_range, Band, ChartSettings, Line, XAxis};
use crate::error::Result;
use plotters::prelude::*;
use std::path::Path;

/// Draw one or more lines, optionally with a shaded band behind them.
pub fn line_chart(
    path: &Path,
    settings: &ChartSettings,
    x_axis: &XAxis,
    lines: &[Line],
    band: Option<&Band>,
) -> Result<()> {
    let xs = lines
        .iter()
        .flat_map(|l| l.points.iter().map(|p| p.0))
        .chain(band.into_iter().flat_map(|b| b.points.iter().map(|p| p.0)));
    let ys = lines
        .iter()
        .flat_map(|l| l.points.iter().map(|p| p.1))
        .chain(
            band.into_iter()
                .flat_map(|b| b.points.iter().flat_map(|p| [p.1, p.2])),
        );
    let (x_min, x_max) = padded_range(xs).ok_or_else(|| no_data(&settings.title))?;
    let (y_min, y_max) = padded_range(ys).ok_or_else(|| no_data(&settings.title))?;

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 26).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(10)
        .x_label_formatter(&|v| x_axis.format(*v))
        .y_label_formatter(&|v| format_amount(*v))
        .x_desc(&settings.x_label)
        .y_desc(&settings.y_label)
        .draw()?;

    if let Some(band) = band {
        let mut outline: Vec<(f64, f64)> = band.points.iter().map(|p| (p.0, p.2)).collect();
        outline.extend(band.points.iter().rev().map(|p| (p.0, p.1)));
        let color = band.color;
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.3).filled())))?
            .label(band.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.3).filled()));
    }

    for line in lines {
        let color = line.color;
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), color.stroke_width(2)))?
            .label(line.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        if line.markers {
            chart.draw_series(
                line.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }
    }

    if lines.len() + usize::from(band.is_some()) > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Vertical bars, one per label, on a segmented x axis.
pub fn bar_chart(
    path: &Path,
    settings: &ChartSettings,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> Result<()> {
    if labels.is_empty() || labels.len() != values.len() {
        return Err(no_data(&settings.title));
    }

    let (lo, hi) = padded_range(values.iter().copied().chain(std::iter::once(0.0)))
        .ok_or_else(|| no_data(&settings.title))?;
    let y_min = lo.min(0.0);

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = labels.len() as u32;
    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 26).into_font())
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..n).into_segmented(), y_min..hi)?;

    let label_for = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .y_labels(10)
        .x_label_formatter(&label_for)
        .y_label_formatter(&|v| format_amount(*v))
        .x_desc(&settings.x_label)
        .y_desc(&settings.y_label)
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
            color.filled(),
        );
        bar.set_margin(0, 0, 3, 3);
        bar
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::BLUE;

    #[test]
    fn test_line_chart_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = line_chart(
            &dir.path().join("empty.png"),
            &ChartSettings::new("Empty"),
            &XAxis::Numeric,
            &[],
            None,
        )
        .unwrap_err();
        assert!(err.is_chart_failure());
    }

    #[test]
    fn test_bar_chart_rejects_mismatched_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = bar_chart(
            &dir.path().join("bars.png"),
            &ChartSettings::new("Bars"),
            &["a".to_string()],
            &[1.0, 2.0],
            BLUE,
        )
        .unwrap_err();
        assert!(err.is_chart_failure());
    }
}
