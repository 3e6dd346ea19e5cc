use crate::error::{ProcessingError, Result};
use crate::loader::load_csv;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes the cleaned dataset and JSON documents into one output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save `df` as CSV (header, no index) under `file_name`.
    ///
    /// The written file is read back and its row count checked.
    pub fn save_dataset(&self, df: &mut DataFrame, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(file_name);
        let mut file = File::create(&output_path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)?;

        info!("Dataset saved: {}", output_path.display());
        self.verify_output(&output_path, df.height())?;

        Ok(output_path)
    }

    fn verify_output(&self, path: &Path, expected_rows: usize) -> Result<()> {
        let written = load_csv(path)?;
        if written.height() != expected_rows {
            return Err(ProcessingError::ReportGenerationFailed(format!(
                "{} has {} rows, expected {}",
                path.display(),
                written.height(),
                expected_rows
            )));
        }
        debug!("Verified {} ({} rows)", path.display(), expected_rows);
        Ok(())
    }

    /// Serialize `value` as pretty JSON under `file_name`.
    pub fn write_json<T: Serialize>(&self, value: &T, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(file_name);
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CLEANED_FILE_NAME;
    use serde_json::json;

    #[test]
    fn test_save_dataset_round_trips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().join("nested"));
        let mut df = df! {
            "Store" => &[1i64, 1, 2],
            "Weekly_Sales" => &[10.5f64, 20.0, 30.25],
        }
        .unwrap();

        let path = generator.save_dataset(&mut df, CLEANED_FILE_NAME).unwrap();
        assert!(path.ends_with(CLEANED_FILE_NAME));

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Store,Weekly_Sales"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let path = generator
            .write_json(&json!({"rows": 3}), "report.json")
            .unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["rows"], 3);
    }
}
