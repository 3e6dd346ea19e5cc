//! Exploratory charts and headline insights for the cleaned dataset.

use crate::aggregation::{
    holiday_means, sales_by_category, sales_by_day_of_week, sales_by_month, sales_by_store,
    sales_by_year,
};
use crate::charts::{
    self, day_offset, ChartSettings, Line, XAxis, BLUE, CYAN, GREEN, ORANGE, PURPLE, RED,
};
use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result};
use crate::loader::{ColumnPresence, PAIR_PLOT_COLUMNS};
use crate::types::{ChartFailure, ChartOutcome, CorrelationMatrix, SalesInsights, SalesRecord};
use crate::utils::column_f64;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub const CORRELATION_PLOT: &str = "correlation_plot.png";
pub const SALES_TREND_PLOT: &str = "Sales_trend_over_time.png";
pub const MONTHLY_SALES_PLOT: &str = "monthly_sales_trends.png";
pub const SALES_DISTRIBUTION_PLOT: &str = "sales_distribution.png";
pub const SALES_BOX_PLOT: &str = "sales_box_plot.png";
pub const YEARLY_SALES_PLOT: &str = "Yearly_sales.png";
pub const PAIR_PLOT: &str = "Pair_plot.png";
pub const STORE_PERFORMANCE_PLOT: &str = "store_sales_performance.png";
pub const DAY_OF_WEEK_PLOT: &str = "sales_by_day_of_week.png";
pub const CATEGORY_PLOT: &str = "sales_by_category.png";
pub const HOLIDAY_IMPACT_PLOT: &str = "holiday_sales_impact.png";

/// Insights plus the charts that were (or could not be) written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExploratoryResult {
    pub insights: SalesInsights,
    pub charts: ChartOutcome,
}

/// Renders the fixed sequence of exploratory charts.
pub struct ExploratoryVisualizer {
    config: ProcessingConfig,
}

impl ExploratoryVisualizer {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Compute insights and, when enabled, write every chart whose columns exist.
    ///
    /// A chart that fails to render is logged and recorded; it never aborts
    /// the remaining charts.
    pub fn render(
        &self,
        df: &DataFrame,
        records: &[SalesRecord],
        correlation: &CorrelationMatrix,
    ) -> ExploratoryResult {
        let presence = ColumnPresence::detect(df);
        let insights = SalesInsights::from_records(records);
        log_insights(&insights);

        let mut outcome = ChartOutcome::default();
        if !self.config.generate_charts {
            debug!("Chart generation disabled");
            return ExploratoryResult {
                insights,
                charts: outcome,
            };
        }

        info!("Rendering exploratory charts into {}", self.config.output_dir.display());
        let dated = presence.date && presence.weekly_sales;

        self.attempt(&mut outcome, CORRELATION_PLOT, !correlation.columns.is_empty(), |path| {
            charts::heatmap(path, &self.settings("Correlation Heatmap", "", ""), correlation)
        });
        self.attempt(&mut outcome, SALES_TREND_PLOT, dated, |path| {
            self.sales_trend(path, records)
        });
        self.attempt(&mut outcome, MONTHLY_SALES_PLOT, dated, |path| {
            let months = sales_by_month(records);
            let labels: Vec<String> = months.iter().map(|m| m.0.clone()).collect();
            let points = months.iter().enumerate().map(|(i, m)| (i as f64, m.1)).collect();
            charts::line_chart(
                path,
                &self.settings("Monthly Sales Trends", "Month", "Total Sales"),
                &XAxis::Labels(labels),
                &[Line::new("Monthly sales", points, BLUE).with_markers()],
                None,
            )
        });

        let sales: Vec<f64> = records.iter().map(|r| r.weekly_sales).collect();
        self.attempt(&mut outcome, SALES_DISTRIBUTION_PLOT, presence.weekly_sales, |path| {
            charts::histogram(
                path,
                &self.settings("Sales Distribution", "Weekly_Sales", "Frequency"),
                &sales,
                self.config.histogram_bins,
                GREEN,
            )
        });
        self.attempt(&mut outcome, SALES_BOX_PLOT, presence.weekly_sales, |path| {
            charts::box_plot(path, &self.settings("Box Plot of Sales", "", "Weekly_Sales"), &sales, CYAN)
                .map(|_| ())
        });
        self.attempt(&mut outcome, YEARLY_SALES_PLOT, dated, |path| {
            let years = sales_by_year(records);
            let labels: Vec<String> = years.iter().map(|y| y.0.to_string()).collect();
            let values: Vec<f64> = years.iter().map(|y| y.1).collect();
            charts::bar_chart(
                path,
                &self.settings("Yearly Sales Trends", "Year", "Total Sales"),
                &labels,
                &values,
                ORANGE,
            )
        });

        let pair_columns: Vec<&str> = PAIR_PLOT_COLUMNS
            .iter()
            .copied()
            .filter(|c| df.get_column_names().iter().any(|n| n.as_str() == *c))
            .collect();
        self.attempt(&mut outcome, PAIR_PLOT, pair_columns.len() >= 2, |path| {
            let columns = pair_columns
                .iter()
                .map(|name| {
                    let values: Vec<f64> = column_f64(df, name)?
                        .into_iter()
                        .map(|v| v.unwrap_or(f64::NAN))
                        .collect();
                    Ok((name.to_string(), values))
                })
                .collect::<Result<Vec<_>>>()?;
            let (w, h) = self.config.chart_size;
            let side = w.max(h);
            charts::pair_plot(
                path,
                &ChartSettings::new("Pair Plot of Sales and Other Variables").size((side, side)),
                &columns,
            )
        });

        let by_store = presence.store && presence.weekly_sales;
        self.attempt(&mut outcome, STORE_PERFORMANCE_PLOT, by_store, |path| {
            let stores = sales_by_store(records);
            let labels: Vec<String> = stores.iter().map(|s| s.0.to_string()).collect();
            let values: Vec<f64> = stores.iter().map(|s| s.1).collect();
            charts::bar_chart(
                path,
                &self.settings("Total Sales by Store", "Store", "Total Sales"),
                &labels,
                &values,
                PURPLE,
            )
        });
        self.attempt(&mut outcome, DAY_OF_WEEK_PLOT, dated, |path| {
            let days = sales_by_day_of_week(records);
            let labels: Vec<String> = days.iter().map(|d| d.0.clone()).collect();
            let values: Vec<f64> = days.iter().map(|d| d.1).collect();
            charts::bar_chart(
                path,
                &self.settings("Sales by Day of the Week", "Day of the Week", "Total Sales"),
                &labels,
                &values,
                GREEN,
            )
        });
        self.attempt(&mut outcome, CATEGORY_PLOT, presence.category && presence.weekly_sales, |path| {
            let categories = sales_by_category(records);
            let labels: Vec<String> = categories.iter().map(|c| c.0.clone()).collect();
            let values: Vec<f64> = categories.iter().map(|c| c.1).collect();
            charts::bar_chart(
                path,
                &self.settings("Total Sales by Product Category", "Category", "Total Sales"),
                &labels,
                &values,
                ORANGE,
            )
        });
        self.attempt(&mut outcome, HOLIDAY_IMPACT_PLOT, presence.holiday_flag && presence.weekly_sales, |path| {
            let holiday = holiday_means(records);
            let mut labels = Vec::new();
            let mut values = Vec::new();
            for (label, mean) in [("0", holiday.non_holiday_mean), ("1", holiday.holiday_mean)] {
                if let Some(mean) = mean {
                    labels.push(label.to_string());
                    values.push(mean);
                }
            }
            charts::bar_chart(
                path,
                &self.settings("Average Sales During Holidays", "Holiday (Yes = 1/No = 0)", "Average Sales"),
                &labels,
                &values,
                RED,
            )
        });

        info!(
            "Exploratory charts: {} written, {} failed, {} skipped",
            outcome.written.len(),
            outcome.failed.len(),
            outcome.skipped.len()
        );
        ExploratoryResult {
            insights,
            charts: outcome,
        }
    }

    fn settings(&self, title: &str, x: &str, y: &str) -> ChartSettings {
        ChartSettings::new(title).labels(x, y).size(self.config.chart_size)
    }

    /// Raw rows in date order, as points with markers.
    fn sales_trend(&self, path: &Path, records: &[SalesRecord]) -> Result<()> {
        let mut dated: Vec<_> = records
            .iter()
            .filter_map(|r| r.date.map(|d| (d, r.weekly_sales)))
            .collect();
        dated.sort_by_key(|p| p.0);
        let origin = dated
            .first()
            .map(|p| p.0)
            .ok_or_else(|| ProcessingError::NoValidValues("Date".to_string()))?;
        let points = dated.iter().map(|(d, v)| (day_offset(origin, *d), *v)).collect();

        charts::line_chart(
            path,
            &self.settings("Sales Trend Over Time", "Date", "Weekly_Sales"),
            &XAxis::Days { origin },
            &[Line::new("Weekly_Sales", points, BLUE).with_markers()],
            None,
        )
    }

    fn attempt<F>(&self, outcome: &mut ChartOutcome, file_name: &str, applicable: bool, draw: F)
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        if !applicable {
            info!("Skipping {}: required columns are missing", file_name);
            outcome.skipped.push(file_name.to_string());
            return;
        }
        let path = self.config.output_dir.join(file_name);
        match draw(&path) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                outcome.written.push(file_name.to_string());
            }
            Err(e) => {
                warn!("Could not render {}: {}", file_name, e);
                outcome.failed.push(ChartFailure {
                    chart: file_name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

fn log_insights(insights: &SalesInsights) {
    for (store, total) in &insights.top_stores {
        info!("Top store {}: {:.2}", store, total);
    }
    for (store, total) in &insights.bottom_stores {
        info!("Bottom store {}: {:.2}", store, total);
    }
    for (month, total) in &insights.top_months {
        info!("Peak month {}: {:.2}", month, total);
    }
    if let Some((day, total)) = &insights.best_day_of_week {
        info!("Day with the highest sales: {} ({:.2})", day, total);
    }
    for (category, total) in &insights.top_categories {
        info!("Top category {}: {:.2}", category, total);
    }
    info!(
        "Average sales, holiday vs non-holiday: {:?} vs {:?}",
        insights.holiday.holiday_mean, insights.holiday.non_holiday_mean
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records() -> Vec<SalesRecord> {
        (0..4)
            .map(|i| SalesRecord {
                store: Some(1 + i % 2),
                date: NaiveDate::from_ymd_opt(2010, 2, 5 + 7 * (i as u32 / 2)),
                weekly_sales: 100.0 * (i + 1) as f64,
                holiday_flag: Some(i == 3),
                temperature: None,
                fuel_price: None,
                cpi: None,
                unemployment: None,
                category: None,
            })
            .collect()
    }

    #[test]
    fn test_render_without_charts_computes_insights() {
        let config = ProcessingConfig::builder().generate_charts(false).build().unwrap();
        let df = df!["Store" => [1i64, 2, 1, 2], "Weekly_Sales" => [100.0, 200.0, 300.0, 400.0]]
            .unwrap();
        let matrix = CorrelationMatrix {
            columns: Vec::new(),
            values: Vec::new(),
        };

        let result = ExploratoryVisualizer::new(config).render(&df, &records(), &matrix);
        assert!(result.charts.written.is_empty());
        assert!(result.charts.failed.is_empty());
        assert_eq!(result.insights.top_stores[0], (2, 600.0));
    }

    #[test]
    fn test_missing_columns_skip_their_charts() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProcessingConfig::builder()
            .output_dir(dir.path())
            .build()
            .unwrap();
        // no Date, Holiday_Flag or Category column
        let df = df!["Store" => [1i64, 2], "Weekly_Sales" => [1.0, 2.0]].unwrap();
        let matrix = CorrelationMatrix {
            columns: Vec::new(),
            values: Vec::new(),
        };

        let result = ExploratoryVisualizer::new(config).render(&df, &[], &matrix);
        let skipped = &result.charts.skipped;
        assert!(skipped.contains(&SALES_TREND_PLOT.to_string()));
        assert!(skipped.contains(&CATEGORY_PLOT.to_string()));
        assert!(skipped.contains(&HOLIDAY_IMPACT_PLOT.to_string()));
        assert!(skipped.contains(&CORRELATION_PLOT.to_string()));
    }
}
