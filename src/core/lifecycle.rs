//! Connection lifecycle phases and their transition log.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a device connection is in its life.
///
/// ```text
/// AwaitingDevice --device_connect--> Monitoring --close--> Closed
///        \_________________________close_________________^
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ConnectionPhase {
    /// Socket is open but no device has identified itself yet
    AwaitingDevice,
    /// A known user's device is streaming samples
    Monitoring,
    /// The transport is gone; the session has been discarded
    Closed,
}

impl State for ConnectionPhase {
    fn name(&self) -> &str {
        match self {
            Self::AwaitingDevice => "AwaitingDevice",
            Self::Monitoring => "Monitoring",
            Self::Closed => "Closed",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Closed)
    }

    fn accepts_samples(&self) -> bool {
        matches!(self, Self::Monitoring)
    }
}

/// A single recorded phase change.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PhaseTransition<S: State> {
    /// Phase being left
    pub from: S,
    /// Phase being entered
    pub to: S,
    /// When the change happened
    pub at: DateTime<Utc>,
}

/// Append-only log of phase changes for one connection.
///
/// # Example
///
/// ```rust
/// use spinewatch::core::{ConnectionPhase, PhaseLog};
/// use chrono::Utc;
///
/// let mut log = PhaseLog::new();
/// log.record(ConnectionPhase::AwaitingDevice, ConnectionPhase::Monitoring, Utc::now());
/// log.record(ConnectionPhase::Monitoring, ConnectionPhase::Closed, Utc::now());
///
/// assert_eq!(
///     log.path(),
///     vec![
///         &ConnectionPhase::AwaitingDevice,
///         &ConnectionPhase::Monitoring,
///         &ConnectionPhase::Closed,
///     ]
/// );
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PhaseLog<S: State> {
    transitions: Vec<PhaseTransition<S>>,
}

impl<S: State> Default for PhaseLog<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> PhaseLog<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a phase change.
    pub fn record(&mut self, from: S, to: S, at: DateTime<Utc>) {
        self.transitions.push(PhaseTransition { from, to, at });
    }

    /// Phases visited in order: the first `from`, then every `to`.
    pub fn path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        path.extend(self.transitions.iter().map(|t| &t.to));
        path
    }

    /// Time between the first and last recorded change.
    ///
    /// `None` when nothing was recorded or the clock went backwards.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.first()?;
        let last = self.transitions.last()?;
        last.at.signed_duration_since(first.at).to_std().ok()
    }

    pub fn transitions(&self) -> &[PhaseTransition<S>] {
        &self.transitions
    }
}
