//! Alerting thresholds and their validation.
//!
//! An [`AlertPolicy`] holds the numbers the session state machine works
//! with: how long posture history is kept, how many samples are needed
//! before judging, how bad the ratio must be and how long to wait between
//! vibrations. Validation uses Stillwater's `Validation` so that a bad
//! configuration file reports every problem in one pass.
//!
//! # Example
//!
//! ```rust
//! use spinewatch::policy::{AlertPolicy, PolicyViolation};
//!
//! let policy = AlertPolicy {
//!     window_secs: 0,
//!     incorrect_ratio: 1.5,
//!     ..AlertPolicy::default()
//! };
//!
//! let violations = policy.validated().unwrap_err();
//! assert_eq!(violations.len(), 2);
//! assert!(violations.contains(&PolicyViolation::EmptyWindow));
//! ```

pub mod rules;
pub mod violations;

pub use rules::{AlertPolicy, MAX_SPAN_SECS};
pub use violations::PolicyViolation;
