//! Offline batch analysis of uploaded sensor logs.
//!
//! Uploads are validated up front: the first bad row rejects the whole
//! file, so no partial analysis is ever reported.
//!
//! # Example
//!
//! ```rust
//! use spinewatch::classifier::ModelClassifier;
//! use spinewatch::ingest::process_upload;
//!
//! let report = process_upload(
//!     &ModelClassifier::default(),
//!     "session.csv",
//!     b"tilt_x,tilt_y\n1.0,2.0\n",
//! )
//! .unwrap();
//! assert_eq!(report.rows_processed, 1);
//!
//! let err = process_upload(&ModelClassifier::default(), "session.csv", b"tilt_x\n1\n")
//!     .unwrap_err();
//! assert!(err.to_string().starts_with("Missing required columns: tilt_y"));
//! ```

mod analysis;
mod error;
mod upload;

pub use analysis::{analyze_batch, BatchAnalysis};
pub use error::BatchError;
pub use upload::{parse_csv, parse_upload, TiltRow, REQUIRED_COLUMNS};

use crate::classifier::Classifier;
use serde::Serialize;

/// Response body for a successful upload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadReport {
    pub success: bool,
    pub analysis: BatchAnalysis,
    pub rows_processed: usize,
}

/// Validate and analyze an uploaded file.
pub fn process_upload<C>(classifier: &C, file_name: &str, content: &[u8]) -> Result<UploadReport, BatchError>
where
    C: Classifier + ?Sized,
{
    let rows = parse_upload(file_name, content)?;
    let analysis = analyze_batch(classifier, &rows);
    tracing::debug!(
        file_name,
        rows = rows.len(),
        correct = analysis.correct_samples,
        "Analyzed offline upload"
    );
    Ok(UploadReport {
        success: true,
        rows_processed: rows.len(),
        analysis,
    })
}
