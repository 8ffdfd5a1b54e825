//! Remote icon collection for application-provided search engines.
//!
//! The collection is the system of record for icon records and their
//! attachments. It is eventually consistent: after a sync it pushes the
//! created, updated, and deleted records to every subscriber.

pub mod collection;
pub mod error;
pub mod memory;

pub use collection::{ChangeStream, RemoteCollection};
pub use error::{RemoteError, RemoteResult};
pub use memory::{CollectionConfig, InMemoryCollection};
