#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Inspection data source: CSV loading, export, and the dataset handle.
//!
//! [`load`] turns a CSV file into [`InspectionRecord`]s atomically (every
//! row parses or the whole load fails). [`export`] writes records back in
//! the same schema. [`Dataset`] owns a loaded record set for the lifetime
//! of a session and reloads it when the source file changes on disk.

pub mod dataset;
pub mod export;
pub mod load;
pub mod parsing;
pub mod progress;

use std::collections::BTreeSet;
use std::path::PathBuf;

use psc_dashboard_inspection_models::InspectionRecord;
use thiserror::Error;

pub use dataset::Dataset;
pub use export::{export, export_to_path};
pub use load::{load, load_from_reader};

/// Default format of the `Date` column (e.g. `01.08.2024`).
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Errors raised while loading an inspection file.
///
/// Every variant is fatal for the load; no partial record set is
/// returned.
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// The input file does not exist.
    #[error("Input file not found: {}", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file has no header or no data rows.
    #[error("{} contains no inspection rows", path.display())]
    Empty {
        /// Path of the empty file.
        path: PathBuf,
    },

    /// A required column is absent from the header row.
    #[error("{} is missing required column '{column}'", path.display())]
    MissingColumn {
        /// Path of the file.
        path: PathBuf,
        /// Name of the missing column.
        column: String,
    },

    /// The configured date format is not a valid `strftime` pattern.
    #[error("Invalid date format '{format}'")]
    InvalidDateFormat {
        /// The rejected format string.
        format: String,
    },

    /// The CSV structure itself is malformed (e.g. ragged rows).
    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        /// Path of the file.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A single field failed to parse.
    #[error("{}:{line}: invalid {column} value '{value}': {message}", path.display())]
    InvalidField {
        /// Path of the file.
        path: PathBuf,
        /// 1-based line number of the offending row.
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell value.
        value: String,
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised while exporting records to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing to the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialisation failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The configured date format could not render a date.
    #[error("Invalid date format '{format}'")]
    DateFormat {
        /// The rejected format string.
        format: String,
    },
}

/// Options controlling how the CSV file is read and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// `strftime` pattern of the `Date` column. Fixed, never auto-detected.
    pub date_format: String,
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            delimiter: b',',
        }
    }
}

impl LoadOptions {
    /// Checks that the date format is a usable `strftime` pattern.
    ///
    /// # Errors
    ///
    /// Returns [`DataFormatError::InvalidDateFormat`] if the pattern
    /// contains an unknown specifier or is empty.
    pub fn validate(&self) -> Result<(), DataFormatError> {
        let has_error = chrono::format::StrftimeItems::new(&self.date_format)
            .any(|item| matches!(item, chrono::format::Item::Error));
        if self.date_format.trim().is_empty() || has_error {
            return Err(DataFormatError::InvalidDateFormat {
                format: self.date_format.clone(),
            });
        }
        Ok(())
    }
}

/// Returns the distinct places in order of first appearance.
///
/// This is the list a place selector offers; every entry is a valid
/// filter value.
#[must_use]
pub fn distinct_places(records: &[InspectionRecord]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.place.as_str()))
        .map(|r| r.place.clone())
        .collect()
}
