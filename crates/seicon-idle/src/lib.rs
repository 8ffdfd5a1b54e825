//! User idle detection.
//!
//! An [`IdleDetector`] fires a registered callback once the user has been
//! inactive for the registration's threshold. Each registration fires at most
//! once; a detector holds at most one registration at a time.
//!
//! - [`ActivityIdleMonitor`] -- timer-driven detector fed by activity reports
//! - [`ManualIdleDetector`] -- fires on demand, for tests and batch tools

pub mod activity;
pub mod detector;
pub mod manual;

pub use activity::ActivityIdleMonitor;
pub use detector::{IdleCallback, IdleDetector, IdleFuture};
pub use manual::ManualIdleDetector;
