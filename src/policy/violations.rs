//! Policy violations reported by validation.

use thiserror::Error;

/// A single problem with an [`AlertPolicy`](super::AlertPolicy).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyViolation {
    #[error("Posture window must be at least one second")]
    EmptyWindow,

    #[error("{field} of {secs}s exceeds the maximum of {max}s")]
    SpanTooLong {
        field: &'static str,
        secs: u64,
        max: u64,
    },

    #[error("Minimum sample count must be at least 1")]
    NoMinimumSamples,

    #[error("Incorrect-posture ratio {ratio} must be within (0, 1]")]
    RatioOutOfRange { ratio: f64 },
}
