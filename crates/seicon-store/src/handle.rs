//! Explicitly released resource handles.
//!
//! A [`ResourceHandle`] is the consumer-facing reference to icon bytes, the
//! equivalent of an object URL. Handles are created and released through a
//! shared [`HandleRegistry`]; clones of a handle refer to the same registry
//! entry, so releasing any clone releases the entry.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::trace;
use uuid::Uuid;

/// Reference to icon bytes plus their MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    id: Uuid,
    bytes: Bytes,
    mimetype: Arc<str>,
}

impl ResourceHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// URL under which the handle is addressable, `blob:<uuid>`.
    pub fn url(&self) -> String {
        format!("blob:{}", self.id)
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("url", &self.url())
            .field("mimetype", &self.mimetype)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Creates and releases [`ResourceHandle`]s, tracking which are live.
#[derive(Default)]
pub struct HandleRegistry {
    live: RwLock<HashSet<Uuid>>,
    created: AtomicU64,
    released: AtomicU64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a live handle for `bytes`.
    pub fn create(&self, bytes: Bytes, mimetype: &str) -> ResourceHandle {
        let handle = ResourceHandle {
            id: Uuid::now_v7(),
            bytes,
            mimetype: Arc::from(mimetype),
        };
        self.live
            .write()
            .expect("lock poisoned")
            .insert(handle.id);
        self.created.fetch_add(1, Ordering::Relaxed);
        trace!(url = %handle.url(), "handle created");
        handle
    }

    /// Release a handle. Returns `false` if it was already released.
    pub fn release(&self, handle: &ResourceHandle) -> bool {
        let removed = self
            .live
            .write()
            .expect("lock poisoned")
            .remove(&handle.id);
        if removed {
            self.released.fetch_add(1, Ordering::Relaxed);
            trace!(url = %handle.url(), "handle released");
        }
        removed
    }

    pub fn is_live(&self, handle: &ResourceHandle) -> bool {
        self.live
            .read()
            .expect("lock poisoned")
            .contains(&handle.id)
    }

    /// Number of handles created and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.read().expect("lock poisoned").len()
    }

    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("live", &self.live_count())
            .field("created", &self.created_count())
            .field("released", &self.released_count())
            .finish()
    }
}
