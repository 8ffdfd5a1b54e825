use std::time::Duration;

use futures::future::BoxFuture;

/// Future returned by an idle callback; the detector drives it to completion.
pub type IdleFuture = BoxFuture<'static, ()>;

/// One-shot callback invoked when the idle threshold is crossed.
pub type IdleCallback = Box<dyn FnOnce() -> IdleFuture + Send + 'static>;

/// Idle-detection capability.
///
/// Implementations must satisfy:
/// - `register` replaces any existing registration.
/// - A registration fires at most once, then is consumed.
/// - `unregister` is a no-op when nothing is registered, including from
///   inside a firing callback.
pub trait IdleDetector: Send + Sync {
    /// Invoke `callback` after `threshold` of continuous inactivity.
    fn register(&self, threshold: Duration, callback: IdleCallback);

    /// Drop the current registration, if any.
    fn unregister(&self);
}
