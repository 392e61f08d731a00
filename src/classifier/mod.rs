//! Classifier seam.
//!
//! The monitor never owns a global model. A [`Classifier`] is handed to the
//! connection environment at construction, so production code runs the
//! loaded models while tests inject fixed answers.

mod model;

pub use model::{LogisticModel, ModelClassifier, ModelError, FALL_MODEL_FILE, POSTURE_MODEL_FILE};

use crate::core::{Classification, FallVerdict, PostureVerdict, SensorReading};

/// Stateless posture and fall classification.
///
/// Returning `None` means "no opinion": the model is missing or could not
/// score these features. It is never an error.
pub trait Classifier: Send + Sync {
    fn classify_posture(&self, tilt: [f64; 2]) -> Option<PostureVerdict>;

    fn classify_fall(&self, gyro: [f64; 3]) -> Option<FallVerdict>;

    fn classify(&self, reading: &SensorReading) -> Classification {
        Classification::new(
            self.classify_posture(reading.tilt()),
            self.classify_fall(reading.gyro()),
        )
    }
}

/// Classifier that answers the same thing for every reading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedClassifier {
    pub answer: Classification,
}

impl FixedClassifier {
    pub fn new(answer: Classification) -> Self {
        Self { answer }
    }
}

impl Classifier for FixedClassifier {
    fn classify_posture(&self, _tilt: [f64; 2]) -> Option<PostureVerdict> {
        self.answer.posture
    }

    fn classify_fall(&self, _gyro: [f64; 3]) -> Option<FallVerdict> {
        self.answer.fall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classify_combines_both_models() {
        let classifier = FixedClassifier::new(Classification::new(
            Some(PostureVerdict {
                correct: false,
                confidence: 0.7,
            }),
            Some(FallVerdict {
                fall: false,
                confidence: 0.99,
            }),
        ));

        let classification = classifier.classify(&SensorReading::default());
        assert_eq!(classification.posture_correct(), Some(false));
        assert_eq!(classification.fall_confidence(), Some(0.99));
        assert!(!classification.is_fall());
    }

    #[test]
    fn default_fixed_classifier_has_no_opinion() {
        let classification = FixedClassifier::default().classify(&SensorReading::default());
        assert_eq!(classification, Classification::default());
    }
}
