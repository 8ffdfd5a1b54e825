use async_trait::async_trait;
use bytes::Bytes;
use seicon_types::{IconRecord, RecordId};

use crate::error::StoreResult;

/// Attachment bytes together with the record revision they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedAttachment {
    pub record: IconRecord,
    pub bytes: Bytes,
}

impl CachedAttachment {
    pub fn new(record: IconRecord, bytes: impl Into<Bytes>) -> Self {
        Self {
            record,
            bytes: bytes.into(),
        }
    }

    /// Returns `true` if this copy was stored for the same revision as `current`.
    pub fn is_current_for(&self, current: &IconRecord) -> bool {
        self.record.last_modified == current.last_modified
    }
}

/// Local cache of downloaded attachments, keyed by record id.
///
/// All implementations must satisfy these invariants:
/// - At most one attachment is kept per record id; `put` replaces it.
/// - `get` returns `Ok(None)` for ids that were never stored.
/// - Concurrent reads are always safe.
/// - Nothing is ever purged; a newer revision overwrites an older one.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Read the cached attachment for a record id.
    async fn get(&self, id: &RecordId) -> StoreResult<Option<CachedAttachment>>;

    /// Store (or replace) the attachment for `attachment.record.id`.
    async fn put(&self, attachment: CachedAttachment) -> StoreResult<()>;
}
