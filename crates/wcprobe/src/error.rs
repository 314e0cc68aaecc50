//! Error types for the probe.

use std::time::Duration;
use thiserror::Error;
use wcprobe_store::StoreError;

/// Probe errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Control frame could not be encoded or decoded.
    #[error("Control frame error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// The other end of a control link has gone away.
    #[error("Control link to {0} is closed")]
    LinkClosed(String),

    /// A bounded store call did not complete in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Not enough observers reported ready before the barrier timed out.
    #[error("Only {ready} of {expected} observers ready after {waited:?}")]
    ReadyTimeout {
        ready: usize,
        expected: usize,
        waited: Duration,
    },

    /// Every observer still owed to the barrier has exited.
    #[error("Observers exited before the barrier: {ready} of {expected} ready")]
    ObserversExited { ready: usize, expected: usize },

    /// Operation called out of order.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, Error>;
