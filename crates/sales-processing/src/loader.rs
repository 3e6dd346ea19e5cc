//! CSV loading, date parsing and the typed record view of the dataset.

use crate::error::{ProcessingError, Result, ResultExt};
use crate::types::{ImputedKeys, SalesRecord, StoreId};
use crate::utils::{column_f64, column_strings};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const COL_DATE: &str = "Date";
pub const COL_STORE: &str = "Store";
pub const COL_WEEKLY_SALES: &str = "Weekly_Sales";
pub const COL_HOLIDAY_FLAG: &str = "Holiday_Flag";
pub const COL_TEMPERATURE: &str = "Temperature";
pub const COL_FUEL_PRICE: &str = "Fuel_Price";
pub const COL_CPI: &str = "CPI";
pub const COL_UNEMPLOYMENT: &str = "Unemployment";
pub const COL_CATEGORY: &str = "Category";

/// Columns shown in the pair plot, in display order.
pub const PAIR_PLOT_COLUMNS: [&str; 6] = [
    COL_WEEKLY_SALES,
    COL_HOLIDAY_FLAG,
    COL_TEMPERATURE,
    COL_FUEL_PRICE,
    COL_CPI,
    COL_UNEMPLOYMENT,
];

// =============================================================================
// CSV Loading
// =============================================================================

/// Load a CSV file with a header row, trying progressively more lenient readers.
///
/// 1. standard reader with `"` quoting
/// 2. reader without explicit quote handling
/// 3. pre-cleaned file content (collapsed doubled quotes, blank lines dropped)
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProcessingError::LoadFailed {
            path: path.display().to_string(),
            reason: "file does not exist".to_string(),
        });
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(log_loaded(path, df)),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(log_loaded(path, df)),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    let content = std::fs::read_to_string(path)?;
    let df = load_csv_str(&clean_csv_content(&content)).map_err(|e| {
        ProcessingError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(log_loaded(path, df))
}

/// Parse CSV content held in memory.
pub fn load_csv_str(content: &str) -> Result<DataFrame> {
    let cursor = Cursor::new(content.as_bytes().to_vec());
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .into_reader_with_file_handle(cursor)
        .finish()
        .context("Parsing CSV content")
}

fn log_loaded(path: &Path, df: DataFrame) -> DataFrame {
    info!(
        "Loaded {} ({} rows x {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    df
}

fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Column Presence
// =============================================================================

/// Which of the expected dataset columns exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPresence {
    pub date: bool,
    pub store: bool,
    pub weekly_sales: bool,
    pub holiday_flag: bool,
    pub temperature: bool,
    pub fuel_price: bool,
    pub cpi: bool,
    pub unemployment: bool,
    pub category: bool,
}

impl ColumnPresence {
    pub fn detect(df: &DataFrame) -> Self {
        let has = |name: &str| df.get_column_names().iter().any(|c| c.as_str() == name);
        Self {
            date: has(COL_DATE),
            store: has(COL_STORE),
            weekly_sales: has(COL_WEEKLY_SALES),
            holiday_flag: has(COL_HOLIDAY_FLAG),
            temperature: has(COL_TEMPERATURE),
            fuel_price: has(COL_FUEL_PRICE),
            cpi: has(COL_CPI),
            unemployment: has(COL_UNEMPLOYMENT),
            category: has(COL_CATEGORY),
        }
    }

    /// Date, Store and Weekly_Sales are all present.
    pub fn supports_time_series(&self) -> bool {
        self.date && self.store && self.weekly_sales
    }

    /// Names of the expected (non-optional) columns that are absent.
    pub fn missing_expected(&self) -> Vec<&'static str> {
        [
            (self.date, COL_DATE),
            (self.store, COL_STORE),
            (self.weekly_sales, COL_WEEKLY_SALES),
            (self.holiday_flag, COL_HOLIDAY_FLAG),
            (self.temperature, COL_TEMPERATURE),
            (self.fuel_price, COL_FUEL_PRICE),
            (self.cpi, COL_CPI),
            (self.unemployment, COL_UNEMPLOYMENT),
        ]
        .into_iter()
        .filter(|(present, _)| !present)
        .map(|(_, name)| name)
        .collect()
    }
}

// =============================================================================
// Date Parsing
// =============================================================================

/// Accepted date layouts, tried in order. Day-first comes before month-first
/// so `05-02-2010` reads as 5 February.
pub const DATE_FORMATS: [&str; 4] = ["%d-%m-%Y", "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parsed dates for a column plus the number of values that could not be read.
#[derive(Debug, Clone, Default)]
pub struct ParsedDates {
    pub dates: Vec<Option<NaiveDate>>,
    pub failures: usize,
}

impl ParsedDates {
    pub fn parsed_count(&self) -> usize {
        self.dates.iter().filter(|d| d.is_some()).count()
    }
}

/// Lenient date parser; unreadable values become `None` and are counted.
#[derive(Debug, Clone)]
pub struct DateParser {
    formats: Vec<String>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            formats: DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl DateParser {
    pub fn with_formats(formats: &[&str]) -> Self {
        Self {
            formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    }

    /// Parse every value of the `Date` column. A missing column is an error;
    /// nulls and unreadable strings are coerced to `None`.
    pub fn parse_column(&self, df: &DataFrame) -> Result<ParsedDates> {
        let column = df
            .column(COL_DATE)
            .map_err(|_| ProcessingError::ColumnNotFound(COL_DATE.to_string()))?;

        let dates: Vec<Option<NaiveDate>> = match column.dtype() {
            DataType::Date => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(|| {
                    ProcessingError::InvalidConfig("invalid epoch date".to_string())
                })?;
                column
                    .as_materialized_series()
                    .cast(&DataType::Int32)?
                    .i32()?
                    .into_iter()
                    .map(|days| {
                        days.and_then(|d| epoch.checked_add_signed(chrono::Duration::days(d as i64)))
                    })
                    .collect()
            }
            _ => column_strings(df, COL_DATE)?
                .into_iter()
                .map(|v| v.and_then(|s| self.parse(&s)))
                .collect(),
        };

        let failures = dates.iter().filter(|d| d.is_none()).count();
        if failures > 0 {
            info!("{} values in '{}' could not be parsed as dates", failures, COL_DATE);
        }
        Ok(ParsedDates { dates, failures })
    }
}

// =============================================================================
// Typed Records
// =============================================================================

/// Build typed records from a frame.
///
/// `Store` and `Weekly_Sales` are required; the remaining columns are optional
/// and read as `None` when absent. Rows with a null sales value are skipped.
/// A store that is not a whole number, or a holiday flag that is not exactly
/// 0 or 1, is read as `None`.
pub fn records_from_frame(df: &DataFrame, dates: &ParsedDates) -> Result<Vec<SalesRecord>> {
    build_records(df, dates, None)
}

/// Shared by [`records_from_frame`] and `CleaningOutcome::records`, which
/// passes the rows whose keys were filled in by imputation.
pub(crate) fn build_records(
    df: &DataFrame,
    dates: &ParsedDates,
    imputed: Option<&ImputedKeys>,
) -> Result<Vec<SalesRecord>> {
    let stores = required_f64(df, COL_STORE)?;
    let sales = required_f64(df, COL_WEEKLY_SALES)?;
    let holiday = optional_f64(df, COL_HOLIDAY_FLAG)?;
    let temperature = optional_f64(df, COL_TEMPERATURE)?;
    let fuel = optional_f64(df, COL_FUEL_PRICE)?;
    let cpi = optional_f64(df, COL_CPI)?;
    let unemployment = optional_f64(df, COL_UNEMPLOYMENT)?;
    let category = if df.get_column_names().iter().any(|c| c.as_str() == COL_CATEGORY) {
        Some(column_strings(df, COL_CATEGORY)?)
    } else {
        None
    };

    let pick = |col: &Option<Vec<Option<f64>>>, i: usize| col.as_ref().and_then(|v| v[i]);
    let (store_filled, holiday_filled): (&[bool], &[bool]) = match imputed {
        Some(keys) => (keys.store.as_slice(), keys.holiday_flag.as_slice()),
        None => (&[], &[]),
    };
    let filled = |mask: &[bool], i: usize| mask.get(i).copied().unwrap_or(false);

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(weekly_sales) = sales[i] else {
            continue;
        };
        let store = stores[i]
            .filter(|_| !filled(store_filled, i))
            .and_then(parse_store_id);
        let holiday_flag = pick(&holiday, i)
            .filter(|_| !filled(holiday_filled, i))
            .and_then(parse_holiday_flag);
        records.push(SalesRecord {
            store,
            date: dates.dates.get(i).copied().flatten(),
            weekly_sales,
            holiday_flag,
            temperature: pick(&temperature, i),
            fuel_price: pick(&fuel, i),
            cpi: pick(&cpi, i),
            unemployment: pick(&unemployment, i),
            category: category.as_ref().and_then(|c| c[i].clone()),
        });
    }

    let storeless = records.iter().filter(|r| r.store.is_none()).count();
    if storeless > 0 {
        info!("{} rows have no usable '{}' value", storeless, COL_STORE);
    }
    debug!("Built {} typed records from {} rows", records.len(), df.height());
    Ok(records)
}

fn parse_store_id(value: f64) -> Option<StoreId> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as StoreId)
}

fn parse_holiday_flag(value: f64) -> Option<bool> {
    if value == 0.0 {
        Some(false)
    } else if value == 1.0 {
        Some(true)
    } else {
        None
    }
}

fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    column_f64(df, name).map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))
}

fn optional_f64(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    if df.get_column_names().iter().any(|c| c.as_str() == name) {
        Ok(Some(column_f64(df, name)?))
    } else {
        Ok(None)
    }
}
