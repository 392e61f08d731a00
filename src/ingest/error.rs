//! Batch upload errors.

use thiserror::Error;

/// Reasons an offline upload is rejected. Messages are shown to the user
/// verbatim.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Unsupported file format for '{file_name}'. Please use CSV files.")]
    UnsupportedFormat { file_name: String },

    #[error("File is empty or has no data rows")]
    Empty,

    #[error(
        "Missing required columns: {}. Available columns: {}",
        .missing.join(", "),
        .available.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// `row` counts the header as row 1.
    #[error("Data validation error at row {row}: Invalid numeric value for {field}: {value}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("File processing error: {0}")]
    Csv(#[from] csv::Error),
}
