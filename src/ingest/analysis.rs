//! Posture scoring for uploaded rows.

use super::upload::TiltRow;
use crate::classifier::Classifier;
use crate::core::PostureVerdict;
use serde::{Deserialize, Serialize};

/// Verdicts for an offline upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// One entry per row; `None` where the model had no opinion
    pub results: Vec<Option<PostureVerdict>>,
    pub correctness_percentage: f64,
    pub total_samples: usize,
    pub correct_samples: usize,
}

/// Classify every row's posture.
///
/// Rows without a verdict count toward the total but never as correct.
pub fn analyze_batch<C>(classifier: &C, rows: &[TiltRow]) -> BatchAnalysis
where
    C: Classifier + ?Sized,
{
    let results: Vec<_> = rows
        .iter()
        .map(|row| classifier.classify_posture([row.tilt_x, row.tilt_y]))
        .collect();

    let correct_samples = results
        .iter()
        .filter(|verdict| verdict.is_some_and(|v| v.correct))
        .count();
    let total_samples = rows.len();
    let correctness_percentage = if total_samples > 0 {
        correct_samples as f64 / total_samples as f64 * 100.0
    } else {
        0.0
    };

    BatchAnalysis {
        results,
        correctness_percentage,
        total_samples,
        correct_samples,
    }
}
