//! Pure core of the monitor.
//!
//! - Sensor readings and classifier verdicts
//! - The time-windowed posture history
//! - The per-connection alerting state machine
//! - Connection lifecycle phases
//!
//! Nothing in this module performs I/O or reads the clock; time is always
//! passed in by the caller.

mod classification;
mod lifecycle;
mod session;
mod state;
mod window;

pub use classification::{Classification, FallVerdict, PostureVerdict, SensorReading};
pub use lifecycle::{ConnectionPhase, PhaseLog, PhaseTransition};
pub use session::{AlertDecision, SessionState, SessionSummary, SessionTally};
pub use state::State;
pub use window::{PostureHistoryEntry, PostureWindow};
