use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use seicon_types::RecordId;

use crate::error::StoreResult;
use crate::traits::{AttachmentStore, CachedAttachment};

/// In-memory, HashMap-based attachment store.
///
/// Intended for tests and embedding. Attachments are held behind a `RwLock`;
/// the bytes are reference counted so reads do not copy them.
pub struct InMemoryAttachmentStore {
    attachments: RwLock<HashMap<RecordId, CachedAttachment>>,
}

impl InMemoryAttachmentStore {
    /// An empty store with no attachments.
    pub fn new() -> Self {
        Self {
            attachments: RwLock::new(HashMap::new()),
        }
    }

    /// Number of attachments currently stored.
    pub fn len(&self) -> usize {
        self.attachments.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no attachments.
    pub fn is_empty(&self) -> bool {
        self.attachments.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryAttachmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn get(&self, id: &RecordId) -> StoreResult<Option<CachedAttachment>> {
        let map = self.attachments.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    async fn put(&self, attachment: CachedAttachment) -> StoreResult<()> {
        let mut map = self.attachments.write().expect("lock poisoned");
        map.insert(attachment.record.id.clone(), attachment);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryAttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAttachmentStore")
            .field("attachment_count", &self.len())
            .finish()
    }
}
