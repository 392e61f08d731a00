//! Core State trait for lifecycle states.
//!
//! Lifecycle states describe where a connection is in its life. They are
//! plain values; inspecting them has no side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for lifecycle states.
///
/// # Required Traits
///
/// - `Clone`: states are copied into the phase log
/// - `PartialEq`: transitions compare the current state
/// - `Debug`: states show up in diagnostics
/// - `Serialize` + `Deserialize`: phase logs can be exported
///
/// # Example
///
/// ```rust
/// use spinewatch::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Link {
///     Idle,
///     Streaming,
///     Gone,
/// }
///
/// impl State for Link {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Streaming => "Streaming",
///             Self::Gone => "Gone",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Gone)
///     }
///
///     fn accepts_samples(&self) -> bool {
///         matches!(self, Self::Streaming)
///     }
/// }
///
/// assert!(Link::Streaming.accepts_samples());
/// assert!(Link::Gone.is_final());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Terminal states accept no further messages.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether sensor samples may be processed in this state.
    ///
    /// Default implementation returns `false`.
    fn accepts_samples(&self) -> bool {
        false
    }
}
