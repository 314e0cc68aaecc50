//! Replicated store boundary for wcprobe.
//!
//! Provides the operations the probe needs from a replica set:
//! - Single and batch inserts with a per-call write concern
//! - Filterable, resumable change feeds over one member's operation log
//! - Log tip and member role queries
//!
//! [`MemoryCluster`] implements the boundary in-process with configurable
//! per-member replication delay, for local runs and tests.

pub mod client;
pub mod error;
pub mod feed;
pub mod memory;

pub use client::{ConnectOptions, Connector, InsertReceipt, StoreClient};
pub use error::{Result, StoreError};
pub use feed::{ChangeEvent, ChangeFeed, FeedFilter, OperationType};
pub use memory::{ClusterSpec, MemberSpec, MemoryClient, MemoryCluster};
