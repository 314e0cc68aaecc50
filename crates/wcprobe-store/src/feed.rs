//! Change feeds over a member's operation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wcprobe_types::{Document, LogPosition};

use crate::{Result, StoreError};

/// Kind of logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Insert,
}

/// One matching operation delivered by a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Log position of the operation; doubles as the resume token.
    pub position: LogPosition,
    pub operation: OperationType,
    pub collection: String,
    pub document: Document,
    /// Time the primary accepted the operation.
    pub cluster_time: DateTime<Utc>,
}

/// Restricts a feed to tagged inserts against one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    pub collection: String,
    pub tag_field: String,
}

impl FeedFilter {
    pub fn new(collection: impl Into<String>, tag_field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            tag_field: tag_field.into(),
        }
    }

    pub fn matches(&self, operation: OperationType, collection: &str, document: &Document) -> bool {
        operation == OperationType::Insert
            && collection == self.collection
            && document.is_tagged(&self.tag_field)
    }
}

/// An open, ordered feed of change events.
///
/// Events arrive in log order. [`ChangeFeed::next`] returns `None` once the
/// feed has ended, whether because it was closed or because the underlying
/// session was lost; callers reopen with the last consumed position as the
/// resume token. The producing task is released on [`ChangeFeed::close`] and,
/// failing that, when the feed is dropped.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<Result<ChangeEvent>>,
    pump: Option<JoinHandle<()>>,
    resume_after: LogPosition,
}

impl ChangeFeed {
    /// Wraps the receiving half of a feed and the task producing into it.
    pub fn new(
        rx: mpsc::Receiver<Result<ChangeEvent>>,
        pump: JoinHandle<()>,
        resume_after: LogPosition,
    ) -> Self {
        Self {
            rx,
            pump: Some(pump),
            resume_after,
        }
    }

    /// Position the feed was opened after.
    pub fn resume_after(&self) -> LogPosition {
        self.resume_after
    }

    /// Waits for the next event. Cancel safe.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent>> {
        self.rx.recv().await
    }

    /// Returns true once the producer has gone away and nothing is buffered.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }

    /// Stops the producer and waits for it to release its resources.
    pub async fn close(mut self) -> Result<()> {
        self.rx.close();
        let Some(pump) = self.pump.take() else {
            return Ok(());
        };
        pump.abort();
        match pump.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(StoreError::Release(e.to_string())),
        }
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}
