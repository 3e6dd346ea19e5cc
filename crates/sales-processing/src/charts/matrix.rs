//! Annotated correlation heatmap and scatter-matrix pair plot.

use super::{distribution::bin_counts, format_amount, no_data, padded_range, ChartSettings, BLUE};
use crate::error::Result;
use crate::types::CorrelationMatrix;
use crate::utils::sorted_finite;
use plotters::prelude::*;
use std::path::Path;

/// Diverging blue-white-red palette for values in `[-1, 1]`.
pub fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 { (MID, COLD, -t) } else { (MID, WARM, t) };
    let lerp = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Correlation heatmap with each cell annotated to two decimals.
pub fn heatmap(path: &Path, settings: &ChartSettings, matrix: &CorrelationMatrix) -> Result<()> {
    let n = matrix.columns.len();
    if n == 0 {
        return Err(no_data(&settings.title));
    }

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let n32 = n as u32;
    let mut chart = ChartBuilder::on(&root)
        .caption(&settings.title, ("sans-serif", 26).into_font())
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d((0u32..n32).into_segmented(), (0u32..n32).into_segmented())?;

    // row 0 is drawn at the top
    let columns = &matrix.columns;
    let x_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => columns.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let y_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) if (*i as usize) < n => columns[n - 1 - *i as usize].clone(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()?;

    let mut cells = Vec::with_capacity(n * n);
    for (i, row) in matrix.values.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let y = (n - 1 - i) as u32;
            let x = j as u32;
            let color = value.map(coolwarm).unwrap_or(RGBColor(240, 240, 240));
            cells.push(Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                color.filled(),
            ));
        }
    }
    chart.draw_series(cells)?;

    let font_size = if n > 8 { 11 } else { 15 };
    let mut labels = Vec::with_capacity(n * n);
    for (i, row) in matrix.values.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let text = value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "nan".to_string());
            let y = (n - 1 - i) as u32;
            labels.push(Text::new(
                text,
                (SegmentValue::CenterOf(j as u32), SegmentValue::CenterOf(y)),
                ("sans-serif", font_size).into_font(),
            ));
        }
    }
    chart.draw_series(labels)?;

    root.present()?;
    Ok(())
}

/// Scatter matrix: histograms on the diagonal, pairwise scatter elsewhere.
pub fn pair_plot(
    path: &Path,
    settings: &ChartSettings,
    columns: &[(String, Vec<f64>)],
) -> Result<()> {
    let k = columns.len();
    if k == 0 {
        return Err(no_data(&settings.title));
    }

    let ranges = columns
        .iter()
        .map(|(_, values)| padded_range(values.iter().copied()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| no_data(&settings.title))?;

    let root = BitMapBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&settings.title, ("sans-serif", 26).into_font())?;
    let cells = root.split_evenly((k, k));

    for (idx, cell) in cells.iter().enumerate() {
        let (row, col) = (idx / k, idx % k);
        let (x_name, x_values) = &columns[col];
        let (y_name, y_values) = &columns[row];
        let (x_min, x_max) = ranges[col];

        if row == col {
            let sorted = sorted_finite(x_values);
            if sorted.is_empty() {
                continue;
            }
            let (min, width, counts) = bin_counts(&sorted, 20);
            let peak = counts.iter().copied().max().unwrap_or(1) as f64;

            let mut chart = ChartBuilder::on(cell)
                .margin(4)
                .x_label_area_size(if row == k - 1 { 30 } else { 0 })
                .y_label_area_size(if col == 0 { 45 } else { 0 })
                .build_cartesian_2d(x_min..x_max, 0.0..peak * 1.1)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(3)
                .y_labels(3)
                .x_label_formatter(&|v| format_amount(*v))
                .y_label_formatter(&|v| format_amount(*v))
                .x_desc(if row == k - 1 { x_name.as_str() } else { "" })
                .draw()?;
            chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
                let x0 = min + width * i as f64;
                Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], BLUE.mix(0.7).filled())
            }))?;
        } else {
            let (y_min, y_max) = ranges[row];
            let mut chart = ChartBuilder::on(cell)
                .margin(4)
                .x_label_area_size(if row == k - 1 { 30 } else { 0 })
                .y_label_area_size(if col == 0 { 45 } else { 0 })
                .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(3)
                .y_labels(3)
                .x_label_formatter(&|v| format_amount(*v))
                .y_label_formatter(&|v| format_amount(*v))
                .x_desc(if row == k - 1 { x_name.as_str() } else { "" })
                .y_desc(if col == 0 { y_name.as_str() } else { "" })
                .draw()?;
            chart.draw_series(
                x_values
                    .iter()
                    .zip(y_values.iter())
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|(&x, &y)| Circle::new((x, y), 1, BLUE.mix(0.5).filled())),
            )?;
        }
    }

    root.present()?;
    Ok(())
}
