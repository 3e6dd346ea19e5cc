//! Sales totals, insights and the per-store weekly series.

use crate::types::{HolidayComparison, SalesInsights, SalesRecord, StoreId, WeeklyGrouping, WeeklySeries};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Totals by store, highest first. Rows without a store id are left out.
pub fn sales_by_store(records: &[SalesRecord]) -> Vec<(StoreId, f64)> {
    let mut totals: BTreeMap<StoreId, f64> = BTreeMap::new();
    for record in records {
        if let Some(store) = record.store {
            *totals.entry(store).or_insert(0.0) += record.weekly_sales;
        }
    }
    sort_descending(totals.into_iter().collect())
}

/// Totals by calendar month (`YYYY-MM`), in chronological order.
pub fn sales_by_month(records: &[SalesRecord]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.date {
            *totals.entry((date.year(), date.month())).or_insert(0.0) += record.weekly_sales;
        }
    }
    totals
        .into_iter()
        .map(|((year, month), total)| (format!("{:04}-{:02}", year, month), total))
        .collect()
}

/// Totals by calendar year, in chronological order.
pub fn sales_by_year(records: &[SalesRecord]) -> Vec<(i32, f64)> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.date {
            *totals.entry(date.year()).or_insert(0.0) += record.weekly_sales;
        }
    }
    totals.into_iter().collect()
}

/// Totals by weekday name, lowest first.
pub fn sales_by_day_of_week(records: &[SalesRecord]) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in records {
        if let Some(date) = record.date {
            *totals.entry(date.format("%A").to_string()).or_insert(0.0) += record.weekly_sales;
        }
    }
    let mut result: Vec<(String, f64)> = totals.into_iter().collect();
    result.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    result
}

/// Mean weekly sales for holiday (`true`) and non-holiday (`false`) weeks.
pub fn holiday_means(records: &[SalesRecord]) -> HolidayComparison {
    let mut sums = [(0.0, 0usize); 2];
    for record in records {
        if let Some(flag) = record.holiday_flag {
            let slot = &mut sums[flag as usize];
            slot.0 += record.weekly_sales;
            slot.1 += 1;
        }
    }
    let mean = |(sum, n): (f64, usize)| (n > 0).then(|| sum / n as f64);
    HolidayComparison {
        non_holiday_mean: mean(sums[0]),
        holiday_mean: mean(sums[1]),
    }
}

/// Totals by product category, highest first. Empty when no record has one.
pub fn sales_by_category(records: &[SalesRecord]) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in records {
        if let Some(category) = &record.category {
            *totals.entry(category.clone()).or_insert(0.0) += record.weekly_sales;
        }
    }
    sort_descending(totals.into_iter().collect())
}

fn sort_descending<K: Ord>(mut items: Vec<(K, f64)>) -> Vec<(K, f64)> {
    items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items
}

impl SalesInsights {
    /// Headline figures printed after the exploratory charts.
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let by_store = sales_by_store(records);
        let bottom_stores = by_store.iter().rev().take(5).rev().copied().collect();
        let top_stores = by_store.iter().take(5).copied().collect();

        let mut months = sales_by_month(records);
        months.sort_by(|a, b| b.1.total_cmp(&a.1));
        months.truncate(3);

        let best_day_of_week = sales_by_day_of_week(records).pop();

        let mut top_categories = sales_by_category(records);
        top_categories.truncate(3);

        Self {
            top_stores,
            bottom_stores,
            top_months: months,
            best_day_of_week,
            holiday: holiday_means(records),
            top_categories,
        }
    }
}

// =============================================================================
// Weekly Series
// =============================================================================

/// The Sunday ending the week that contains `date` (Sundays map to themselves).
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_from_sunday = date.weekday().num_days_from_sunday() as i64;
    date + Duration::days((7 - days_from_sunday) % 7)
}

/// Sum weekly sales per store and calendar week.
///
/// Weeks inside a store's observed span with no rows are inserted with zero
/// sales so every series has a regular weekly index. Stores come back in
/// ascending id order. Rows without a date or a store id are counted and
/// skipped.
pub fn weekly_store_series(records: &[SalesRecord]) -> WeeklyGrouping {
    let mut per_store: BTreeMap<StoreId, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    let mut undated_rows = 0;
    let mut storeless_rows = 0;

    for record in records {
        let Some(date) = record.date else {
            undated_rows += 1;
            continue;
        };
        let Some(store) = record.store else {
            storeless_rows += 1;
            continue;
        };
        *per_store
            .entry(store)
            .or_default()
            .entry(week_ending(date))
            .or_insert(0.0) += record.weekly_sales;
    }

    let mut filled_weeks = 0;
    let series: Vec<WeeklySeries> = per_store
        .into_iter()
        .filter_map(|(store, weeks)| {
            let first = *weeks.keys().next()?;
            let last = *weeks.keys().next_back()?;

            let mut dates = Vec::new();
            let mut values = Vec::new();
            let mut current = first;
            while current <= last {
                match weeks.get(&current) {
                    Some(total) => values.push(*total),
                    None => {
                        filled_weeks += 1;
                        values.push(0.0);
                    }
                }
                dates.push(current);
                current += Duration::weeks(1);
            }

            debug!("Store {}: {} weeks", store, values.len());
            Some(WeeklySeries { store, dates, values })
        })
        .collect();

    info!(
        "Grouped sales into {} weekly store series ({} undated and {} storeless rows skipped, {} empty weeks filled)",
        series.len(),
        undated_rows,
        storeless_rows,
        filled_weeks
    );

    WeeklyGrouping {
        series,
        undated_rows,
        storeless_rows,
        filled_weeks,
    }
}

/// All store series concatenated store by store, in ascending store order.
pub fn stacked_series(series: &[WeeklySeries]) -> Vec<f64> {
    series.iter().flat_map(|s| s.values.iter().copied()).collect()
}

/// Chain-wide weekly totals across every store, in date order.
pub fn chain_total_series(series: &[WeeklySeries]) -> (Vec<NaiveDate>, Vec<f64>) {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for store in series {
        for (date, value) in store.dates.iter().zip(&store.values) {
            *totals.entry(*date).or_insert(0.0) += value;
        }
    }
    totals.into_iter().unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(store: StoreId, d: Option<NaiveDate>, sales: f64) -> SalesRecord {
        SalesRecord {
            store: Some(store),
            date: d,
            weekly_sales: sales,
            holiday_flag: Some(false),
            temperature: None,
            fuel_price: None,
            cpi: None,
            unemployment: None,
            category: None,
        }
    }

    #[test]
    fn test_week_ending() {
        // 2010-02-05 is a Friday
        assert_eq!(week_ending(date(2010, 2, 5)), date(2010, 2, 7));
        assert_eq!(week_ending(date(2010, 2, 7)), date(2010, 2, 7));
        assert_eq!(week_ending(date(2010, 2, 8)), date(2010, 2, 14));
    }

    #[test]
    fn test_weekly_series_sorted_and_gap_filled() {
        let records = vec![
            record(2, Some(date(2010, 2, 5)), 10.0),
            record(1, Some(date(2010, 2, 5)), 1.0),
            record(1, Some(date(2010, 2, 6)), 2.0),
            record(1, Some(date(2010, 2, 19)), 4.0),
            record(1, None, 100.0),
            SalesRecord {
                store: None,
                ..record(1, Some(date(2010, 2, 5)), 7777.0)
            },
        ];

        let grouping = weekly_store_series(&records);
        assert_eq!(grouping.undated_rows, 1);
        assert_eq!(grouping.storeless_rows, 1);
        assert_eq!(grouping.filled_weeks, 1);

        let stores: Vec<StoreId> = grouping.series.iter().map(|s| s.store).collect();
        assert_eq!(stores, vec![1, 2]);

        let store1 = &grouping.series[0];
        assert_eq!(store1.dates, vec![date(2010, 2, 7), date(2010, 2, 14), date(2010, 2, 21)]);
        assert_eq!(store1.values, vec![3.0, 0.0, 4.0]);
    }

    #[test]
    fn test_weekly_sum_matches_dated_total() {
        let mut records = Vec::new();
        for store in 1..=3 {
            for week in 0..20 {
                let d = date(2011, 1, 7) + Duration::weeks(week);
                records.push(record(store, Some(d), 1000.0 * store as f64 + week as f64 * 0.37));
            }
        }

        let grouping = weekly_store_series(&records);
        let grouped: f64 = grouping.series.iter().map(|s| s.total()).sum();
        let original: f64 = records.iter().map(|r| r.weekly_sales).sum();
        assert!((grouped - original).abs() < 1e-6);
    }

    #[test]
    fn test_stacked_and_chain_total() {
        let series = vec![
            WeeklySeries {
                store: 1,
                dates: vec![date(2010, 2, 7), date(2010, 2, 14)],
                values: vec![1.0, 2.0],
            },
            WeeklySeries {
                store: 2,
                dates: vec![date(2010, 2, 14), date(2010, 2, 21)],
                values: vec![10.0, 20.0],
            },
        ];

        assert_eq!(stacked_series(&series), vec![1.0, 2.0, 10.0, 20.0]);

        let (dates, totals) = chain_total_series(&series);
        assert_eq!(dates.len(), 3);
        assert_eq!(totals, vec![1.0, 12.0, 20.0]);
    }

    #[test]
    fn test_totals_and_insights() {
        let mut records = vec![
            record(1, Some(date(2010, 2, 5)), 100.0),
            record(2, Some(date(2010, 3, 5)), 300.0),
            record(3, Some(date(2011, 3, 4)), 200.0),
        ];
        records[1].holiday_flag = Some(true);
        records[0].category = Some("Food".to_string());
        records[2].category = Some("Toys".to_string());

        assert_eq!(sales_by_store(&records), vec![(2, 300.0), (3, 200.0), (1, 100.0)]);
        assert_eq!(
            sales_by_month(&records),
            vec![
                ("2010-02".to_string(), 100.0),
                ("2010-03".to_string(), 300.0),
                ("2011-03".to_string(), 200.0),
            ]
        );
        assert_eq!(sales_by_year(&records), vec![(2010, 400.0), (2011, 200.0)]);
        assert_eq!(sales_by_day_of_week(&records), vec![("Friday".to_string(), 600.0)]);

        let holiday = holiday_means(&records);
        assert_eq!(holiday.holiday_mean, Some(300.0));
        assert_eq!(holiday.non_holiday_mean, Some(150.0));

        let insights = SalesInsights::from_records(&records);
        assert_eq!(insights.top_stores[0], (2, 300.0));
        assert_eq!(insights.bottom_stores.last(), Some(&(1, 100.0)));
        assert_eq!(insights.top_months[0].0, "2010-03");
        assert_eq!(insights.best_day_of_week, Some(("Friday".to_string(), 600.0)));
        assert_eq!(insights.top_categories[0], ("Toys".to_string(), 200.0));
    }
}
