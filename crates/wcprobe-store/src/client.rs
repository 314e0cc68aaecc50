//! Traits implemented by a store backend.

use async_trait::async_trait;
use wcprobe_types::{Document, LogPosition, MemberStatus, WriteConcern};

use crate::{ChangeFeed, FeedFilter, Result};

/// Options applied to a new connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Write concern for writes that do not set their own.
    pub default_concern: Option<WriteConcern>,
}

impl ConnectOptions {
    pub fn with_default_concern(concern: Option<WriteConcern>) -> Self {
        Self {
            default_concern: concern,
        }
    }
}

/// Outcome of an acknowledged insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReceipt {
    pub inserted: usize,
    /// Position of the last inserted document in the primary's log.
    pub last_position: LogPosition,
    /// Write concern that was actually applied.
    pub concern: WriteConcern,
}

/// One connection to a replica set or to a single member.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Inserts one document. `concern = None` uses the connection default.
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        concern: Option<WriteConcern>,
    ) -> Result<InsertReceipt>;

    /// Inserts a batch of documents in order.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
        concern: Option<WriteConcern>,
    ) -> Result<InsertReceipt>;

    /// Opens a feed of matching operations strictly after `resume_after`.
    ///
    /// `None` starts at the current tip.
    async fn open_feed(
        &self,
        filter: FeedFilter,
        resume_after: Option<LogPosition>,
    ) -> Result<ChangeFeed>;

    /// Position of the newest entry in the operation log.
    async fn log_tip(&self) -> Result<LogPosition>;

    /// Role and replication progress of the connected member.
    async fn member_status(&self) -> Result<MemberStatus>;

    /// Releases the connection. Further calls fail with `Closed`.
    async fn close(&self) -> Result<()>;
}

/// Opens connections from endpoint strings.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Client: StoreClient + 'static;

    async fn connect(&self, endpoint: &str, options: ConnectOptions) -> Result<Self::Client>;
}
