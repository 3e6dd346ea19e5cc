//! Output files: the cleaned dataset CSV and JSON documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_processing::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.save_dataset(&mut cleaned, "Walmart_Cleaned_DataSet.csv")?;
//! generator.write_json(&report, "analysis_report.json")?;
//! ```

mod generator;

pub use generator::ReportGenerator;
