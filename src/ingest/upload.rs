//! CSV parsing and validation for offline uploads.

use super::error::BatchError;
use serde::{Deserialize, Serialize};

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 2] = ["tilt_x", "tilt_y"];

/// One validated upload row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiltRow {
    pub tilt_x: f64,
    pub tilt_y: f64,
}

/// Parse an uploaded file, picking the reader from its extension.
pub fn parse_upload(file_name: &str, content: &[u8]) -> Result<Vec<TiltRow>, BatchError> {
    if file_name.to_ascii_lowercase().ends_with(".csv") {
        parse_csv(content)
    } else {
        Err(BatchError::UnsupportedFormat {
            file_name: file_name.to_string(),
        })
    }
}

/// Parse CSV content with a header row.
///
/// Stops at the first invalid row; nothing is returned for a file that
/// fails validation.
pub fn parse_csv(content: &[u8]) -> Result<Vec<TiltRow>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(BatchError::Empty);
    }

    let position = |name: &str| headers.iter().position(|h| h == name);
    let (Some(x_col), Some(y_col)) = (position("tilt_x"), position("tilt_y")) else {
        return Err(BatchError::MissingColumns {
            missing: REQUIRED_COLUMNS
                .iter()
                .filter(|c| position(**c).is_none())
                .map(|c| c.to_string())
                .collect(),
            available: headers.iter().map(String::from).collect(),
        });
    };

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let row = i + 2;
            Ok(TiltRow {
                tilt_x: numeric(record.get(x_col), "tilt_x", row)?,
                tilt_y: numeric(record.get(y_col), "tilt_y", row)?,
            })
        })
        .collect()
}

// A short row has no cell for the column; it is reported as `None`.
fn numeric(value: Option<&str>, field: &'static str, row: usize) -> Result<f64, BatchError> {
    let invalid = |shown: &str| BatchError::InvalidValue {
        row,
        field,
        value: shown.to_string(),
    };
    let value = value.ok_or_else(|| invalid("None"))?;
    value.parse::<f64>().map_err(|_| invalid(value))
}
