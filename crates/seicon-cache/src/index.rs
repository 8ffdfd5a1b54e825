use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use seicon_remote::RemoteCollection;
use seicon_types::IconRecord;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::IconError;

/// Lazily loaded snapshot of the icon records in the remote collection.
///
/// Loads are single-flight: callers that arrive while a load is running wait
/// for it and observe its result instead of starting another one. A failed
/// load is logged and leaves an empty snapshot, so icon resolution degrades
/// to "no icon" rather than failing.
pub struct IconIndex {
    collection: String,
    remote: Arc<dyn RemoteCollection>,
    snapshot: RwLock<Option<Arc<Vec<IconRecord>>>>,
    load_lock: Mutex<()>,
    generation: AtomicU64,
}

impl IconIndex {
    /// Index over `remote`; `collection` names it in log output.
    pub fn new(collection: impl Into<String>, remote: Arc<dyn RemoteCollection>) -> Self {
        Self {
            collection: collection.into(),
            remote,
            snapshot: RwLock::new(None),
            load_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The current snapshot, if a load has completed.
    pub fn snapshot(&self) -> Option<Arc<Vec<IconRecord>>> {
        self.snapshot.read().expect("index lock poisoned").clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().expect("index lock poisoned").is_some()
    }

    /// Number of loads completed so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Return the snapshot, loading it on first use.
    pub async fn ensure_loaded(&self) -> Arc<Vec<IconRecord>> {
        if let Some(snapshot) = self.snapshot() {
            return snapshot;
        }
        let _guard = self.load_lock.lock().await;
        // Another caller may have finished loading while we waited.
        if let Some(snapshot) = self.snapshot() {
            return snapshot;
        }
        self.load_locked().await
    }

    /// Replace the snapshot with a fresh load.
    ///
    /// If a load completes while this call is waiting for the load lock, its
    /// result is returned instead of loading again.
    pub async fn reload(&self) -> Arc<Vec<IconRecord>> {
        let seen = self.generation();
        let _guard = self.load_lock.lock().await;
        if self.generation() != seen {
            if let Some(snapshot) = self.snapshot() {
                return snapshot;
            }
        }
        self.load_locked().await
    }

    async fn load_locked(&self) -> Arc<Vec<IconRecord>> {
        let records = match self.remote.records().await {
            Ok(records) => records,
            Err(e) => {
                let e = IconError::from(e);
                error!(
                    collection = %self.collection,
                    error = %e,
                    "icon list load failed, using an empty index"
                );
                Vec::new()
            }
        };
        if records.is_empty() {
            error!(collection = %self.collection, "failed to obtain search engine icon list records");
        } else {
            debug!(collection = %self.collection, records = records.len(), "icon list loaded");
        }

        let snapshot = Arc::new(records);
        *self.snapshot.write().expect("index lock poisoned") = Some(Arc::clone(&snapshot));
        self.generation.fetch_add(1, Ordering::SeqCst);
        snapshot
    }
}

impl std::fmt::Debug for IconIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconIndex")
            .field("collection", &self.collection)
            .field("loaded", &self.is_loaded())
            .field("generation", &self.generation())
            .finish()
    }
}

/// Records whose patterns cover `identifier`, in index order.
pub fn matching_records<'a>(records: &'a [IconRecord], identifier: &str) -> Vec<&'a IconRecord> {
    records.iter().filter(|r| r.matches(identifier)).collect()
}

/// Pick the record whose width equals `preferred_width`, falling back to the
/// first candidate.
pub fn select_record<'a>(
    candidates: &[&'a IconRecord],
    preferred_width: u32,
) -> Option<&'a IconRecord> {
    candidates
        .iter()
        .find(|r| r.image_size == preferred_width)
        .or_else(|| candidates.first())
        .copied()
}
