//! Logistic models loaded from JSON.

use super::Classifier;
use crate::core::{FallVerdict, PostureVerdict};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const POSTURE_MODEL_FILE: &str = "posture_model.json";
pub const FALL_MODEL_FILE: &str = "fall_detection_model.json";

/// Errors that can occur while loading a model file
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Binary logistic regression: `p = sigmoid(bias + weights · features)`.
///
/// # Example
///
/// ```rust
/// use spinewatch::classifier::LogisticModel;
///
/// let model = LogisticModel { weights: vec![2.0, -1.0], bias: 0.0 };
/// let (positive, confidence) = model.predict(&[1.0, 0.0]).unwrap();
/// assert!(positive);
/// assert!(confidence > 0.8);
///
/// // Wrong feature count: no opinion
/// assert!(model.predict(&[1.0]).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Probability of the positive class.
    pub fn probability(&self, features: &[f64]) -> Option<f64> {
        if features.len() != self.weights.len() {
            return None;
        }
        let z = self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let p = 1.0 / (1.0 + (-z).exp());
        p.is_finite().then_some(p)
    }

    /// Predicted class and the probability of that class.
    pub fn predict(&self, features: &[f64]) -> Option<(bool, f64)> {
        let p = self.probability(features)?;
        Some((p >= 0.5, p.max(1.0 - p)))
    }
}

/// Classifier backed by optional posture and fall models.
///
/// A missing model makes the matching classification "no opinion".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelClassifier {
    posture: Option<LogisticModel>,
    fall: Option<LogisticModel>,
}

impl ModelClassifier {
    pub fn new(posture: Option<LogisticModel>, fall: Option<LogisticModel>) -> Self {
        Self { posture, fall }
    }

    /// Load both models from `dir`. Failures are logged and leave that
    /// model absent.
    pub fn load_dir(dir: &Path) -> Self {
        Self {
            posture: load_optional(&dir.join(POSTURE_MODEL_FILE)),
            fall: load_optional(&dir.join(FALL_MODEL_FILE)),
        }
    }

    pub fn has_posture_model(&self) -> bool {
        self.posture.is_some()
    }

    pub fn has_fall_model(&self) -> bool {
        self.fall.is_some()
    }
}

fn load_optional(path: &Path) -> Option<LogisticModel> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Model file not found, classification disabled");
        return None;
    }
    match LogisticModel::load(path) {
        Ok(model) => {
            tracing::info!(path = %path.display(), features = model.weights.len(), "Loaded model");
            Some(model)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Error loading model");
            None
        }
    }
}

impl Classifier for ModelClassifier {
    fn classify_posture(&self, tilt: [f64; 2]) -> Option<PostureVerdict> {
        let (correct, confidence) = self.posture.as_ref()?.predict(&tilt)?;
        Some(PostureVerdict {
            correct,
            confidence,
        })
    }

    fn classify_fall(&self, gyro: [f64; 3]) -> Option<FallVerdict> {
        let (fall, confidence) = self.fall.as_ref()?.predict(&gyro)?;
        Some(FallVerdict { fall, confidence })
    }
}
