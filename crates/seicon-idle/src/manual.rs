use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::detector::{IdleCallback, IdleDetector};

struct Registration {
    threshold: Duration,
    callback: IdleCallback,
}

/// Idle detector that fires only when told to.
///
/// Counts registrations so callers can assert how often they asked to be
/// notified.
#[derive(Default)]
pub struct ManualIdleDetector {
    registration: Mutex<Option<Registration>>,
    registrations: AtomicUsize,
    unregistrations: AtomicUsize,
}

impl ManualIdleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the current registration and wait for its callback to finish.
    ///
    /// Returns `false` if nothing was registered.
    pub async fn fire(&self) -> bool {
        let registration = self
            .registration
            .lock()
            .expect("idle lock poisoned")
            .take();
        match registration {
            Some(registration) => {
                debug!(threshold = ?registration.threshold, "manual idle fired");
                (registration.callback)().await;
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registration
            .lock()
            .expect("idle lock poisoned")
            .is_some()
    }

    /// Threshold of the current registration.
    pub fn threshold(&self) -> Option<Duration> {
        self.registration
            .lock()
            .expect("idle lock poisoned")
            .as_ref()
            .map(|r| r.threshold)
    }

    /// Number of `register` calls so far.
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Number of `unregister` calls so far.
    pub fn unregistration_count(&self) -> usize {
        self.unregistrations.load(Ordering::SeqCst)
    }
}

impl IdleDetector for ManualIdleDetector {
    fn register(&self, threshold: Duration, callback: IdleCallback) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        *self.registration.lock().expect("idle lock poisoned") =
            Some(Registration { threshold, callback });
    }

    fn unregister(&self) {
        self.unregistrations.fetch_add(1, Ordering::SeqCst);
        self.registration.lock().expect("idle lock poisoned").take();
    }
}

impl std::fmt::Debug for ManualIdleDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualIdleDetector")
            .field("registered", &self.is_registered())
            .field("registrations", &self.registration_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counting_callback(counter: Arc<AtomicUsize>) -> IdleCallback {
        Box::new(move || {
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn fire_runs_callback_once() {
        let detector = ManualIdleDetector::new();
        let fired = Arc::new(AtomicUsize::new(0));
        detector.register(Duration::from_secs(30), counting_callback(fired.clone()));

        assert!(detector.is_registered());
        assert_eq!(detector.threshold(), Some(Duration::from_secs(30)));
        assert!(detector.fire().await);
        assert!(!detector.fire().await);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!detector.is_registered());
    }

    #[tokio::test]
    async fn unregister_drops_callback() {
        let detector = ManualIdleDetector::new();
        let fired = Arc::new(AtomicUsize::new(0));
        detector.register(Duration::from_secs(30), counting_callback(fired.clone()));
        detector.unregister();

        assert!(!detector.fire().await);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(detector.registration_count(), 1);
        assert_eq!(detector.unregistration_count(), 1);
    }

    #[tokio::test]
    async fn callback_may_unregister() {
        let detector = Arc::new(ManualIdleDetector::new());
        let inner = detector.clone();
        detector.register(
            Duration::from_secs(1),
            Box::new(move || {
                Box::pin(async move {
                    inner.unregister();
                })
            }),
        );
        assert!(detector.fire().await);
        assert_eq!(detector.unregistration_count(), 1);
    }
}
