//! Spinewatch: posture and fall alerting for wearable sensors
//!
//! Spinewatch follows a "pure core, imperative shell" layout. The per-device
//! alerting logic is a plain state machine with no I/O and no clock of its
//! own, while classification, persistence and alert delivery live behind
//! traits in the effectful shell.
//!
//! # Core Concepts
//!
//! - **Session**: sliding window of posture verdicts, fall detection and
//!   vibration cooldown for one connection
//! - **Policy**: validated thresholds the session works with
//! - **Connection**: message-level adapter that drives a session
//! - **Ingest**: offline analysis of uploaded CSV logs
//!
//! # Example
//!
//! ```rust
//! use spinewatch::core::{Classification, PostureVerdict, SessionState};
//! use spinewatch::policy::AlertPolicy;
//! use chrono::{Duration, Utc};
//!
//! let policy = AlertPolicy {
//!     min_samples: 3,
//!     ..AlertPolicy::default()
//! };
//! let start = Utc::now();
//! let mut session = SessionState::new(policy, start);
//!
//! let slouch = Classification::new(
//!     Some(PostureVerdict { correct: false, confidence: 0.8 }),
//!     None,
//! );
//!
//! let decisions: Vec<_> = (0..3)
//!     .map(|i| session.on_sample(&slouch, start + Duration::seconds(i)))
//!     .collect();
//!
//! assert!(!decisions[1].vibration_alert);
//! assert!(decisions[2].vibration_alert);
//! ```

pub mod classifier;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod effects;
pub mod error;
pub mod ingest;
pub mod policy;
pub mod protocol;
pub mod store;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use core::{AlertDecision, Classification, SensorReading, SessionState, State};
pub use effects::{Connection, MonitorEnv};
pub use error::MonitorError;
pub use policy::AlertPolicy;
