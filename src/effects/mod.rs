//! Imperative shell around the pure core.
//!
//! The core decides; this module acts. A [`Connection`] feeds each inbound
//! message through the classifier, the session state machine, the store and
//! the alert dispatcher, all reached through a [`MonitorEnv`].
//!
//! # Key Concepts
//!
//! - **Environment**: collaborators are injected, never global
//! - **Effects**: classification runs as a Stillwater effect over the environment
//! - **Connection**: owns exactly one session and its phase log

mod connection;
mod env;

pub use connection::{Connection, DeviceBinding};
pub use env::{classify, MonitorEnv};
