use async_trait::async_trait;
use bytes::Bytes;
use seicon_types::{IconRecord, RecordChanges};
use tokio::sync::broadcast;

use crate::error::RemoteResult;

/// A broadcast channel receiver for collection change batches.
pub type ChangeStream = broadcast::Receiver<RecordChanges>;

/// Interface to the remote icon collection.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Fetch the current, authoritative list of records.
    async fn records(&self) -> RemoteResult<Vec<IconRecord>>;

    /// Download the attachment bytes for a record.
    async fn download(&self, record: &IconRecord) -> RemoteResult<Bytes>;

    /// Subscribe to change batches published after each sync.
    fn subscribe(&self) -> ChangeStream;
}
