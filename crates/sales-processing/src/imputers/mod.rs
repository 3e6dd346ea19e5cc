//! Imputation module for handling missing values.
//!
//! Statistical imputation (mean, median, zero, mode, constant).

mod statistical;

pub use statistical::StatisticalImputer;
