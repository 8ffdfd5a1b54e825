//! Timer-driven idle detection.
//!
//! [`ActivityIdleMonitor`] keeps the instant of the most recent reported user
//! activity. A registration spawns a watcher task that sleeps until
//! `last_activity + threshold`; activity reported in the meantime pushes the
//! deadline out, and the watcher goes back to sleep. When a deadline passes
//! with no newer activity, the watcher claims the registration and runs the
//! callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::detector::{IdleCallback, IdleDetector};

struct Registration {
    generation: u64,
    abort: AbortHandle,
}

struct Inner {
    last_activity: Mutex<Instant>,
    registration: Mutex<Option<Registration>>,
    next_generation: AtomicU64,
}

impl Inner {
    fn last_activity(&self) -> Instant {
        *self.last_activity.lock().expect("idle lock poisoned")
    }

    /// Take the registration if it is still `generation`.
    fn claim(&self, generation: u64) -> bool {
        let mut registration = self.registration.lock().expect("idle lock poisoned");
        match registration.as_ref() {
            Some(r) if r.generation == generation => {
                registration.take();
                true
            }
            _ => false,
        }
    }
}

/// Idle detector driven by activity reports and `tokio` timers.
///
/// Must be used from within a `tokio` runtime: registering spawns a task.
#[derive(Clone)]
pub struct ActivityIdleMonitor {
    inner: Arc<Inner>,
}

impl ActivityIdleMonitor {
    /// Create a monitor that treats "now" as the last activity.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                last_activity: Mutex::new(Instant::now()),
                registration: Mutex::new(None),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Report user activity, restarting the inactivity clock.
    pub fn record_activity(&self) {
        *self.inner.last_activity.lock().expect("idle lock poisoned") = Instant::now();
        trace!("user activity recorded");
    }

    /// Time since the last reported activity.
    pub fn idle_for(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inner.last_activity())
    }

    pub fn is_registered(&self) -> bool {
        self.inner
            .registration
            .lock()
            .expect("idle lock poisoned")
            .is_some()
    }
}

impl Default for ActivityIdleMonitor {
    fn default() -> Self {
        Self::new()
    }
}

async fn watch(inner: Arc<Inner>, generation: u64, threshold: Duration, callback: IdleCallback) {
    loop {
        let deadline = inner.last_activity() + threshold;
        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep_until(deadline).await;
    }

    if !inner.claim(generation) {
        return;
    }
    debug!(threshold = ?threshold, "user idle");
    callback().await;
}

impl IdleDetector for ActivityIdleMonitor {
    fn register(&self, threshold: Duration, callback: IdleCallback) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        // Hold the slot while spawning so the watcher cannot claim before the
        // registration is recorded.
        let mut registration = self.inner.registration.lock().expect("idle lock poisoned");
        if let Some(previous) = registration.take() {
            previous.abort.abort();
        }
        let task = tokio::spawn(watch(self.inner.clone(), generation, threshold, callback));
        *registration = Some(Registration {
            generation,
            abort: task.abort_handle(),
        });
        debug!(generation, threshold = ?threshold, "idle observer registered");
    }

    fn unregister(&self) {
        let registration = self
            .inner
            .registration
            .lock()
            .expect("idle lock poisoned")
            .take();
        if let Some(registration) = registration {
            registration.abort.abort();
            debug!(generation = registration.generation, "idle observer removed");
        }
    }
}

impl std::fmt::Debug for ActivityIdleMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityIdleMonitor")
            .field("idle_for", &self.idle_for())
            .field("registered", &self.is_registered())
            .finish()
    }
}
