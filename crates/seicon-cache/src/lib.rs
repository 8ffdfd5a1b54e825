//! Icon resolution for application-provided search engines.
//!
//! [`IconHandler`] resolves an engine identifier and a preferred width to a
//! [`seicon_store::ResourceHandle`], serving locally cached attachments and
//! deferring every download to a single batched flush that runs once the user
//! is idle.
//!
//! # Flow
//!
//! 1. The [`IconIndex`] is loaded from the remote collection on first use.
//! 2. Records whose patterns match the identifier are filtered; the one with
//!    the exact width wins, otherwise the first match.
//! 3. The local attachment store is consulted. A missing attachment yields
//!    `None`; an outdated one is still served. Both queue the record in
//!    [`PendingUpdates`] and arm the [`IdleGate`].
//! 4. Change batches pushed by the collection are queued the same way.
//! 5. On idle, the handler reloads the index, downloads every pending
//!    attachment, and hands a fresh handle to every live [`IconConsumer`]
//!    whose identifier matches.
//!
//! Nothing here is fatal: failures degrade to "no icon this time" and are
//! logged.

pub mod config;
pub mod consumer;
pub mod error;
pub mod gate;
pub mod handler;
pub mod index;
pub mod pending;

pub use config::{ConfigError, IconCacheConfig};
pub use consumer::{ConsumerRegistry, IconConsumer, NoConsumers};
pub use error::IconError;
pub use gate::IdleGate;
pub use handler::{FlushReport, IconHandler, IconServices};
pub use index::{matching_records, select_record, IconIndex};
pub use pending::PendingUpdates;
