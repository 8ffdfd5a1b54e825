use std::sync::{Arc, Weak};

use bytes::Bytes;
use seicon_idle::{IdleCallback, IdleDetector, IdleFuture};
use seicon_remote::RemoteCollection;
use seicon_store::{AttachmentStore, CachedAttachment, HandleRegistry, ResourceHandle};
use seicon_types::{IconRecord, RecordChanges, RecordId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::IconCacheConfig;
use crate::consumer::ConsumerRegistry;
use crate::error::IconError;
use crate::gate::IdleGate;
use crate::index::{matching_records, select_record, IconIndex};
use crate::pending::PendingUpdates;

/// Collaborators an [`IconHandler`] is wired to.
pub struct IconServices {
    pub remote: Arc<dyn RemoteCollection>,
    pub store: Arc<dyn AttachmentStore>,
    pub handles: Arc<HandleRegistry>,
    pub idle: Arc<dyn IdleDetector>,
    pub consumers: Arc<dyn ConsumerRegistry>,
}

/// Outcome of one idle flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Records whose attachment was downloaded and cached.
    pub downloaded: Vec<RecordId>,
    /// Records that could not be downloaded, verified, or cached. They are
    /// not retried.
    pub failed: Vec<(RecordId, IconError)>,
    /// Number of handles handed to consumers.
    pub consumers_updated: usize,
}

struct HandlerState {
    pending: PendingUpdates,
    gate: IdleGate,
}

/// Resolves icons for engine identifiers and keeps the local cache fresh.
///
/// Reads never download. Missing and outdated attachments are queued and
/// fetched together the next time the user goes idle; at most one idle
/// registration is outstanding at any time. The pending set and the gate
/// share one lock, which a flush holds from start to finish.
pub struct IconHandler {
    me: Weak<IconHandler>,
    config: IconCacheConfig,
    index: IconIndex,
    remote: Arc<dyn RemoteCollection>,
    store: Arc<dyn AttachmentStore>,
    handles: Arc<HandleRegistry>,
    idle: Arc<dyn IdleDetector>,
    consumers: Arc<dyn ConsumerRegistry>,
    state: Mutex<HandlerState>,
}

impl IconHandler {
    pub fn new(config: IconCacheConfig, services: IconServices) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            index: IconIndex::new(config.collection.clone(), Arc::clone(&services.remote)),
            remote: services.remote,
            store: services.store,
            handles: services.handles,
            idle: services.idle,
            consumers: services.consumers,
            state: Mutex::new(HandlerState {
                pending: PendingUpdates::new(),
                gate: IdleGate::new(),
            }),
            config,
        })
    }

    pub fn config(&self) -> &IconCacheConfig {
        &self.config
    }

    pub fn index(&self) -> &IconIndex {
        &self.index
    }

    /// Registry that every handle returned by this handler belongs to.
    pub fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_pending(&self, id: &RecordId) -> bool {
        self.state.lock().await.pending.contains(id)
    }

    pub async fn is_idle_armed(&self) -> bool {
        self.state.lock().await.gate.is_armed()
    }

    /// Resolve an icon for `identifier`, preferring a record of
    /// `preferred_width` pixels.
    ///
    /// Returns `None` when nothing matches or when the matching record has
    /// no cached attachment yet. An outdated cached attachment is returned
    /// as is; the current revision is fetched on the next idle flush.
    pub async fn get_icon(&self, identifier: &str, preferred_width: u32) -> Option<ResourceHandle> {
        let records = self.index.ensure_loaded().await;
        let candidates = matching_records(&records, identifier);
        let Some(record) = select_record(&candidates, preferred_width) else {
            let e = IconError::NoMatch {
                identifier: identifier.to_string(),
            };
            warn!(error = %e, "icon lookup failed");
            return None;
        };
        let record = record.clone();

        let cached = match self.store.get(&record.id).await {
            Ok(cached) => cached,
            Err(e) => {
                error!(record_id = %record.id, error = %e, "attachment cache read failed");
                None
            }
        };

        let Some(cached) = cached else {
            let e = IconError::AttachmentMissing {
                record_id: record.id.clone(),
            };
            debug!(identifier, error = %e, "icon not cached yet, queueing download");
            self.queue(std::iter::once(record)).await;
            return None;
        };

        if !cached.is_current_for(&record) {
            let e = IconError::AttachmentStale {
                record_id: record.id.clone(),
                cached: cached.record.last_modified,
                current: record.last_modified,
            };
            debug!(identifier, error = %e, "serving outdated icon");
            self.queue(std::iter::once(record.clone())).await;
        }

        Some(self.handles.create(cached.bytes, &record.attachment.mimetype))
    }

    /// Queue every created and updated record of a change batch.
    ///
    /// Deletions are ignored; the next index reload drops deleted records.
    pub async fn on_remote_change(&self, changes: &RecordChanges) {
        let incoming: Vec<IconRecord> = changes.incoming().cloned().collect();
        if incoming.is_empty() {
            debug!("icon change batch carries no new records");
            return;
        }
        debug!(records = incoming.len(), "icon change batch queued");
        self.queue(incoming).await;
    }

    /// Forward change batches from the remote collection to
    /// [`on_remote_change`](Self::on_remote_change) until the collection
    /// closes its stream or the handler is dropped.
    pub fn listen(&self) -> JoinHandle<()> {
        let mut stream = self.remote.subscribe();
        let me = self.me.clone();
        tokio::spawn(async move {
            loop {
                match stream.recv().await {
                    Ok(changes) => {
                        let Some(handler) = me.upgrade() else {
                            break;
                        };
                        handler.on_remote_change(&changes).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "icon change stream lagged, batches dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("icon change listener stopped");
        })
    }

    /// Apply every pending update.
    ///
    /// Reloads the index, downloads and caches each pending attachment, then
    /// hands a new handle to every live consumer whose identifier the record
    /// covers. Failed records are logged and dropped. The pending set is
    /// empty afterwards.
    pub async fn on_idle(&self) -> FlushReport {
        let mut state = self.state.lock().await;
        state.gate.disarm();
        self.idle.unregister();

        self.index.reload().await;
        let consumers = self.consumers.live_consumers().await;
        let mut report = FlushReport::default();

        for record in state.pending.values() {
            let bytes = match self.download(record).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(error = %e, "could not refresh icon");
                    report.failed.push((record.id.clone(), e));
                    continue;
                }
            };
            report.downloaded.push(record.id.clone());

            for consumer in consumers.iter().filter(|c| record.matches(c.identifier())) {
                let handle = self.handles.create(bytes.clone(), &record.attachment.mimetype);
                consumer.update_icon(handle);
                report.consumers_updated += 1;
            }
        }
        state.pending.clear();

        info!(
            collection = %self.config.collection,
            downloaded = report.downloaded.len(),
            failed = report.failed.len(),
            consumers_updated = report.consumers_updated,
            "icon updates applied"
        );
        report
    }

    async fn download(&self, record: &IconRecord) -> Result<Bytes, IconError> {
        let failed = |reason: String| IconError::DownloadFailed {
            record_id: record.id.clone(),
            reason,
        };

        let bytes = self
            .remote
            .download(record)
            .await
            .map_err(|e| failed(e.to_string()))?;
        record
            .attachment
            .verify(&bytes)
            .map_err(|e| failed(e.to_string()))?;

        self.store
            .put(CachedAttachment::new(record.clone(), bytes.clone()))
            .await
            .map_err(|e| IconError::CacheWriteFailed {
                record_id: record.id.clone(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }

    async fn queue(&self, records: impl IntoIterator<Item = IconRecord>) {
        let mut state = self.state.lock().await;
        for record in records {
            state.pending.insert(record);
        }
        self.arm_idle(&mut state);
    }

    fn arm_idle(&self, state: &mut HandlerState) {
        if state.pending.is_empty() || !state.gate.arm() {
            return;
        }
        debug!(delay = ?self.config.idle_delay(), "waiting for idle to apply icon updates");
        let me = self.me.clone();
        let callback: IdleCallback = Box::new(move || -> IdleFuture {
            Box::pin(async move {
                if let Some(handler) = me.upgrade() {
                    handler.on_idle().await;
                }
            })
        });
        self.idle.register(self.config.idle_delay(), callback);
    }
}

impl std::fmt::Debug for IconHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconHandler")
            .field("config", &self.config)
            .field("index", &self.index)
            .finish()
    }
}
