//! PNG chart primitives built on plotters.
//!
//! Every function renders one file and returns [`ProcessingError::ChartFailed`]
//! (through the `From<DrawingAreaErrorKind>` conversion) when the backend
//! cannot draw, e.g. when no font is available.

mod basic;
mod distribution;
mod matrix;
mod panels;

pub use basic::{bar_chart, line_chart};
pub use distribution::{box_plot, gaussian_kde, histogram, BoxStats};
pub use matrix::{coolwarm, heatmap, pair_plot};
pub use panels::line_and_stems;

use crate::error::ProcessingError;
use chrono::{Duration, NaiveDate};
use plotters::style::RGBColor;

pub const BLUE: RGBColor = RGBColor(31, 119, 180);
pub const ORANGE: RGBColor = RGBColor(255, 127, 14);
pub const GREEN: RGBColor = RGBColor(44, 160, 44);
pub const RED: RGBColor = RGBColor(214, 39, 40);
pub const PURPLE: RGBColor = RGBColor(148, 103, 189);
pub const CYAN: RGBColor = RGBColor(23, 190, 207);
pub const PINK: RGBColor = RGBColor(255, 105, 180);

/// Title, axis descriptions and pixel size of a chart.
#[derive(Debug, Clone)]
pub struct ChartSettings {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl ChartSettings {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            width: 1000,
            height: 600,
        }
    }

    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn size(mut self, (width, height): (u32, u32)) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// How x values of a line chart are labelled.
#[derive(Debug, Clone)]
pub enum XAxis {
    /// Plain numbers (observation index, lag, ...).
    Numeric,
    /// x is a day offset from `origin`; labels are rendered as dates.
    Days { origin: NaiveDate },
    /// x is an index into these labels.
    Labels(Vec<String>),
}

impl XAxis {
    pub fn format(&self, x: f64) -> String {
        match self {
            XAxis::Numeric => format!("{:.0}", x),
            XAxis::Days { origin } => (*origin + Duration::days(x.round() as i64))
                .format("%Y-%m-%d")
                .to_string(),
            XAxis::Labels(labels) => {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            }
        }
    }
}

/// One line of a line chart.
#[derive(Debug, Clone)]
pub struct Line {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub markers: bool,
}

impl Line {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            name: name.into(),
            points,
            color,
            markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// Shaded interval between `lower` and `upper` at each x.
#[derive(Debug, Clone)]
pub struct Band {
    pub name: String,
    /// (x, lower, upper)
    pub points: Vec<(f64, f64, f64)>,
    pub color: RGBColor,
}

/// Day offset of `date` from `origin`, for [`XAxis::Days`] charts.
pub fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Min/max of the finite values, widened by 5% (or by 1 for a flat range).
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max - min < f64::EPSILON * max.abs().max(1.0) {
        let pad = (min.abs() * 0.1).max(1.0);
        return Some((min - pad, max + pad));
    }
    let pad = (max - min) * 0.05;
    Some((min - pad, max + pad))
}

pub(crate) fn no_data(title: &str) -> ProcessingError {
    ProcessingError::ChartFailed(format!("'{}' has no finite values to plot", title))
}

/// Compact tick labels for large sales figures.
pub fn format_amount(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}K", v / 1e3)
    } else if abs >= 10.0 || abs == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(vec![0.0, 10.0]), Some((-0.5, 10.5)));
        assert_eq!(padded_range(vec![5.0, 5.0]), Some((4.0, 6.0)));
        assert_eq!(padded_range(vec![f64::NAN]), None);
        assert_eq!(padded_range(Vec::new()), None);
    }

    #[test]
    fn test_axis_format() {
        let origin = NaiveDate::from_ymd_opt(2010, 2, 7).unwrap();
        assert_eq!(XAxis::Days { origin }.format(7.0), "2010-02-14");

        let labels = XAxis::Labels(vec!["2010-02".to_string(), "2010-03".to_string()]);
        assert_eq!(labels.format(1.0), "2010-03");
        assert_eq!(labels.format(0.5), "");
        assert_eq!(labels.format(5.0), "");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000.0), "1.5M");
        assert_eq!(format_amount(2_600.0), "3K");
        assert_eq!(format_amount(0.25), "0.25");
        assert_eq!(format_amount(0.0), "0");
    }
}
