//! Errors on the per-connection message path.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while handling one inbound message.
///
/// None of these close the connection; the adapter turns them into an
/// outbound `error` message.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Connection is closed")]
    Closed,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
