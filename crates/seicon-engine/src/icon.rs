use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use seicon_cache::IconHandler;
use seicon_store::ResourceHandle;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// In-flight icon resolution shared by every caller that asked for it.
pub type IconFuture = Shared<BoxFuture<'static, Option<ResourceHandle>>>;

enum Slot {
    Empty,
    Pending { future: IconFuture, abort: AbortHandle },
    Resolved(ResourceHandle),
}

struct BindingState {
    slot: Slot,
    /// Bumped whenever the slot is replaced, so a resolution can tell whether
    /// it is still the one the slot is waiting for.
    generation: u64,
    released: bool,
}

/// The icon of one engine: at most one live handle, resolved on first use
/// and replaced when a newer icon is pushed.
///
/// Every handle that enters the binding is released exactly once, whether
/// it is replaced, arrives after the binding was released, or belongs to a
/// resolution that was superseded.
pub struct IconBinding {
    identifier: String,
    handler: Arc<IconHandler>,
    state: Arc<Mutex<BindingState>>,
}

impl IconBinding {
    pub fn new(identifier: impl Into<String>, handler: Arc<IconHandler>) -> Self {
        Self {
            identifier: identifier.into(),
            handler,
            state: Arc::new(Mutex::new(BindingState {
                slot: Slot::Empty,
                generation: 0,
                released: false,
            })),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Return the icon, resolving it through the handler on first use.
    ///
    /// Concurrent callers share one resolution. A resolution that finds no
    /// icon leaves the binding empty, so a later call tries again.
    pub async fn get_resource(&self, preferred_width: u32) -> Option<ResourceHandle> {
        let future = {
            let mut state = self.state.lock().expect("binding lock poisoned");
            if state.released {
                return None;
            }
            match &state.slot {
                Slot::Resolved(handle) => return Some(handle.clone()),
                Slot::Pending { future, .. } => future.clone(),
                Slot::Empty => self.start_resolution(&mut state, preferred_width),
            }
        };

        match future.await {
            Some(handle) => Some(handle),
            // An update may have replaced the resolution while we waited.
            None => self.current(),
        }
    }

    /// The resolved handle, if any, without starting a resolution.
    pub fn current(&self) -> Option<ResourceHandle> {
        match &self.state.lock().expect("binding lock poisoned").slot {
            Slot::Resolved(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.state.lock().expect("binding lock poisoned").slot,
            Slot::Pending { .. }
        )
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().expect("binding lock poisoned").released
    }

    /// Install a newer icon.
    ///
    /// A resolved handle is released first and a pending resolution is
    /// cancelled. Returns `false`, releasing `handle`, if the binding was
    /// already released.
    pub fn update_resource(&self, handle: ResourceHandle) -> bool {
        let mut state = self.state.lock().expect("binding lock poisoned");
        if state.released {
            drop(state);
            self.handler.handles().release(&handle);
            debug!(identifier = %self.identifier, "icon update after release discarded");
            return false;
        }

        state.generation += 1;
        match std::mem::replace(&mut state.slot, Slot::Resolved(handle)) {
            Slot::Resolved(old) => {
                self.handler.handles().release(&old);
            }
            Slot::Pending { abort, .. } => abort.abort(),
            Slot::Empty => {}
        }
        trace!(identifier = %self.identifier, "icon installed");
        true
    }

    /// Release the held handle and cancel any pending resolution. The
    /// binding stays empty afterwards. Idempotent.
    pub fn release(&self) {
        let mut state = self.state.lock().expect("binding lock poisoned");
        self.release_locked(&mut state);
    }

    fn release_locked(&self, state: &mut BindingState) {
        if std::mem::replace(&mut state.released, true) {
            return;
        }
        state.generation += 1;
        match std::mem::replace(&mut state.slot, Slot::Empty) {
            Slot::Resolved(handle) => {
                self.handler.handles().release(&handle);
            }
            Slot::Pending { abort, .. } => abort.abort(),
            Slot::Empty => {}
        }
    }

    fn start_resolution(&self, state: &mut BindingState, preferred_width: u32) -> IconFuture {
        state.generation += 1;
        let generation = state.generation;

        let handler = Arc::clone(&self.handler);
        let identifier = self.identifier.clone();
        let shared = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let handle = handler.get_icon(&identifier, preferred_width).await;
            settle(&shared, &handler, generation, handle)
        });

        let abort = task.abort_handle();
        let future = async move { task.await.ok().flatten() }.boxed().shared();
        state.slot = Slot::Pending {
            future: future.clone(),
            abort,
        };
        future
    }
}

/// Complete resolution `generation`: install its handle if the slot is still
/// waiting for it, release the handle otherwise.
fn settle(
    state: &Mutex<BindingState>,
    handler: &IconHandler,
    generation: u64,
    handle: Option<ResourceHandle>,
) -> Option<ResourceHandle> {
    let mut state = state.lock().expect("binding lock poisoned");
    let current = state.generation == generation
        && !state.released
        && matches!(state.slot, Slot::Pending { .. });

    if !current {
        if let Some(handle) = handle {
            handler.handles().release(&handle);
        }
        return None;
    }

    state.slot = match &handle {
        Some(handle) => Slot::Resolved(handle.clone()),
        None => Slot::Empty,
    };
    handle
}

impl Drop for IconBinding {
    fn drop(&mut self) {
        // Must not panic: drop may run during unwinding.
        let state = Arc::clone(&self.state);
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        self.release_locked(&mut state);
    }
}

impl std::fmt::Debug for IconBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconBinding")
            .field("identifier", &self.identifier)
            .field("resolved", &self.current().is_some())
            .field("released", &self.is_released())
            .finish()
    }
}
