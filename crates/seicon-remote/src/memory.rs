use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use seicon_types::{IconRecord, RecordChanges, RecordId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::collection::{ChangeStream, RemoteCollection};
use crate::error::{RemoteError, RemoteResult};

/// Configuration for the [`InMemoryCollection`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Capacity of the change broadcast channel.
    pub channel_capacity: usize,
    /// Simulated round-trip time applied to every remote call.
    pub latency: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            latency: Duration::ZERO,
        }
    }
}

/// In-memory icon collection.
///
/// Holds records and attachment bytes in memory and broadcasts change batches
/// on [`publish`](Self::publish). Call counters and failure switches make it
/// suitable as a test double; the CLI uses it to serve fixture files.
pub struct InMemoryCollection {
    records: RwLock<Vec<IconRecord>>,
    attachments: RwLock<HashMap<RecordId, Bytes>>,
    sender: broadcast::Sender<RecordChanges>,
    config: CollectionConfig,
    unavailable: AtomicBool,
    failing_downloads: RwLock<HashSet<RecordId>>,
    records_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl InMemoryCollection {
    pub fn new(config: CollectionConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            records: RwLock::new(Vec::new()),
            attachments: RwLock::new(HashMap::new()),
            sender,
            config,
            unavailable: AtomicBool::new(false),
            failing_downloads: RwLock::new(HashSet::new()),
            records_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Add or replace a record without notifying subscribers.
    pub fn insert_record(&self, record: IconRecord) {
        let mut records = self.records.write().expect("collection lock poisoned");
        upsert(&mut records, record);
    }

    /// Set the downloadable bytes for a record id.
    pub fn set_attachment(&self, id: impl Into<RecordId>, bytes: impl Into<Bytes>) {
        self.attachments
            .write()
            .expect("collection lock poisoned")
            .insert(id.into(), bytes.into());
    }

    /// Apply a change batch to the collection and broadcast it.
    ///
    /// Returns the number of subscribers the batch was delivered to.
    pub fn publish(&self, changes: RecordChanges) -> usize {
        {
            let mut records = self.records.write().expect("collection lock poisoned");
            for record in changes.incoming() {
                upsert(&mut records, record.clone());
            }
            for record in &changes.deleted {
                records.retain(|r| r.id != record.id);
            }
        }

        match self.sender.send(changes) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("change batch published with no subscribers");
                0
            }
        }
    }

    /// Make `records()` fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make downloads for `id` fail.
    pub fn fail_download(&self, id: impl Into<RecordId>) {
        self.failing_downloads
            .write()
            .expect("collection lock poisoned")
            .insert(id.into());
    }

    /// Number of `records()` calls served so far.
    pub fn records_calls(&self) -> usize {
        self.records_calls.load(Ordering::SeqCst)
    }

    /// Number of `download()` calls served so far.
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new(CollectionConfig::default())
    }
}

fn upsert(records: &mut Vec<IconRecord>, record: IconRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

#[async_trait]
impl RemoteCollection for InMemoryCollection {
    async fn records(&self) -> RemoteResult<Vec<IconRecord>> {
        self.records_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("collection is offline".into()));
        }
        Ok(self.records.read().expect("collection lock poisoned").clone())
    }

    async fn download(&self, record: &IconRecord) -> RemoteResult<Bytes> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self
            .failing_downloads
            .read()
            .expect("collection lock poisoned")
            .contains(&record.id)
        {
            return Err(RemoteError::TransportError(format!(
                "download of {} refused",
                record.id
            )));
        }
        self.attachments
            .read()
            .expect("collection lock poisoned")
            .get(&record.id)
            .cloned()
            .ok_or_else(|| RemoteError::AttachmentNotFound(record.id.clone()))
    }

    fn subscribe(&self) -> ChangeStream {
        self.sender.subscribe()
    }
}

impl std::fmt::Debug for InMemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCollection")
            .field(
                "record_count",
                &self.records.read().expect("collection lock poisoned").len(),
            )
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seicon_types::{AttachmentMeta, RecordUpdate};

    fn record(id: &str, last_modified: u64) -> IconRecord {
        IconRecord::new(id, ["shop*"], 32, AttachmentMeta::new("image/png"), last_modified)
    }

    #[tokio::test]
    async fn records_returns_snapshot_and_counts_calls() {
        let collection = InMemoryCollection::default();
        collection.insert_record(record("a", 1));
        collection.insert_record(record("b", 1));
        collection.insert_record(record("a", 2));

        let records = collection.records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId::new("a"));
        assert_eq!(records[0].last_modified, 2);
        assert_eq!(collection.records_calls(), 1);
    }

    #[tokio::test]
    async fn unavailable_collection_fails() {
        let collection = InMemoryCollection::default();
        collection.set_unavailable(true);
        assert!(matches!(
            collection.records().await,
            Err(RemoteError::Unavailable(_))
        ));
        collection.set_unavailable(false);
        assert!(collection.records().await.is_ok());
    }

    #[tokio::test]
    async fn download_missing_and_failing() {
        let collection = InMemoryCollection::default();
        let a = record("a", 1);
        assert!(matches!(
            collection.download(&a).await,
            Err(RemoteError::AttachmentNotFound(_))
        ));

        collection.set_attachment("a", &b"icon"[..]);
        assert_eq!(&collection.download(&a).await.unwrap()[..], b"icon");

        collection.fail_download("a");
        assert!(matches!(
            collection.download(&a).await,
            Err(RemoteError::TransportError(_))
        ));
        assert_eq!(collection.download_calls(), 3);
    }

    #[tokio::test]
    async fn publish_applies_and_broadcasts() {
        let collection = InMemoryCollection::default();
        collection.insert_record(record("a", 1));
        collection.insert_record(record("gone", 1));
        let mut stream = collection.subscribe();

        let changes = RecordChanges {
            created: vec![record("b", 1)],
            updated: vec![RecordUpdate::new(record("a", 1), record("a", 2))],
            deleted: vec![record("gone", 1)],
        };
        assert_eq!(collection.publish(changes.clone()), 1);

        let received = stream.try_recv().unwrap();
        assert_eq!(received, changes);

        let records = collection.records().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(records[0].last_modified, 2);
    }

    #[test]
    fn publish_without_subscribers_still_applies() {
        let collection = InMemoryCollection::default();
        assert_eq!(collection.publish(RecordChanges::created(vec![record("a", 1)])), 0);
        assert_eq!(collection.records.read().unwrap().len(), 1);
    }
}
