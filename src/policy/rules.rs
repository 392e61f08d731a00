//! Alert thresholds, validated with `Validation` so all violations surface.

use crate::policy::violations::PolicyViolation;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Longest window or cooldown accepted (one week).
pub const MAX_SPAN_SECS: u64 = 7 * 24 * 60 * 60;

/// Thresholds for the posture vibration alert.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// How long a posture classification stays in the history
    pub window_secs: u64,
    /// History size required before the ratio is judged
    pub min_samples: usize,
    /// Share of incorrect entries that triggers a vibration (inclusive)
    pub incorrect_ratio: f64,
    /// Minimum spacing between two vibrations (inclusive)
    pub cooldown_secs: u64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            window_secs: 300,
            min_samples: 100,
            incorrect_ratio: 0.60,
            cooldown_secs: 300,
        }
    }
}

impl AlertPolicy {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(span_secs(self.window_secs))
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(span_secs(self.cooldown_secs))
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<PolicyViolation>> {
        let checks = vec![
            check(self.window_secs > 0, || PolicyViolation::EmptyWindow),
            check(self.window_secs <= MAX_SPAN_SECS, || {
                PolicyViolation::SpanTooLong {
                    field: "window",
                    secs: self.window_secs,
                    max: MAX_SPAN_SECS,
                }
            }),
            check(self.cooldown_secs <= MAX_SPAN_SECS, || {
                PolicyViolation::SpanTooLong {
                    field: "cooldown",
                    secs: self.cooldown_secs,
                    max: MAX_SPAN_SECS,
                }
            }),
            check(self.min_samples > 0, || PolicyViolation::NoMinimumSamples),
            check(
                self.incorrect_ratio.is_finite()
                    && self.incorrect_ratio > 0.0
                    && self.incorrect_ratio <= 1.0,
                || PolicyViolation::RatioOutOfRange {
                    ratio: self.incorrect_ratio,
                },
            ),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// Like [`validate`](Self::validate), as a `Result` that hands the
    /// policy back on success.
    pub fn validated(self) -> Result<Self, Vec<PolicyViolation>> {
        match self.validate() {
            Validation::Success(()) => Ok(self),
            Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
        }
    }
}

fn check<F>(ok: bool, violation: F) -> Validation<(), NonEmptyVec<PolicyViolation>>
where
    F: FnOnce() -> PolicyViolation,
{
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

// Clamped so unvalidated policies cannot overflow chrono.
fn span_secs(secs: u64) -> i64 {
    secs.min(MAX_SPAN_SECS) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        let policy = AlertPolicy::default();
        assert!(policy.validate().is_success());
        assert_eq!(policy.window(), chrono::Duration::seconds(300));
        assert_eq!(policy.cooldown(), chrono::Duration::seconds(300));
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let policy = AlertPolicy {
            window_secs: 0,
            min_samples: 0,
            incorrect_ratio: f64::NAN,
            cooldown_secs: MAX_SPAN_SECS + 1,
        };

        match policy.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 4);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, PolicyViolation::EmptyWindow)));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, PolicyViolation::NoMinimumSamples)));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, PolicyViolation::RatioOutOfRange { .. })));
                assert!(errors.iter().any(|e| matches!(
                    e,
                    PolicyViolation::SpanTooLong {
                        field: "cooldown",
                        ..
                    }
                )));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn ratio_of_one_is_allowed() {
        let policy = AlertPolicy {
            incorrect_ratio: 1.0,
            ..AlertPolicy::default()
        };
        assert!(policy.validate().is_success());
    }

    #[test]
    fn zero_ratio_is_rejected() {
        let policy = AlertPolicy {
            incorrect_ratio: 0.0,
            ..AlertPolicy::default()
        };
        assert_eq!(
            policy.validated(),
            Err(vec![PolicyViolation::RatioOutOfRange { ratio: 0.0 }])
        );
    }

    #[test]
    fn zero_cooldown_is_allowed() {
        let policy = AlertPolicy {
            cooldown_secs: 0,
            ..AlertPolicy::default()
        };
        assert!(policy.validated().is_ok());
    }

    #[test]
    fn oversized_window_is_clamped_when_converted() {
        let policy = AlertPolicy {
            window_secs: u64::MAX,
            ..AlertPolicy::default()
        };
        assert!(policy.validate().is_failure());
        assert_eq!(policy.window(), chrono::Duration::seconds(MAX_SPAN_SECS as i64));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let policy: AlertPolicy = toml::from_str("min_samples = 20").unwrap();
        assert_eq!(policy.min_samples, 20);
        assert_eq!(policy.window_secs, 300);
        assert_eq!(policy.incorrect_ratio, 0.60);
    }
}
