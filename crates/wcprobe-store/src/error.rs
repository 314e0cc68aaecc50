//! Error types for the store boundary.

use thiserror::Error;
use wcprobe_types::{DocumentId, WriteConcern};

/// Store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Endpoint uses a scheme no connector understands.
    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    /// Endpoint names no known member or replica set.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Member cannot be reached or refused the request.
    #[error("Member {0} is unavailable")]
    Unavailable(String),

    /// A write was sent directly to a member that is not primary.
    #[error("Member {0} is not primary")]
    NotPrimary(String),

    /// The client has been closed.
    #[error("Client is closed")]
    Closed,

    /// A document with the same id already exists in the collection.
    #[error("Duplicate key: {0}")]
    DuplicateKey(DocumentId),

    /// Named write concern mode is not defined by the replica set.
    #[error("Unknown write concern mode: {0}")]
    UnknownWriteConcernMode(String),

    /// Write concern asks for more members than the replica set has.
    #[error("Write concern w={concern} cannot be satisfied by {members} members")]
    UnsatisfiableWriteConcern { concern: WriteConcern, members: usize },

    /// Replica set description is inconsistent.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Releasing a feed or connection failed.
    #[error("Failed to release resource: {0}")]
    Release(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
