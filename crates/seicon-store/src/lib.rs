//! Local attachment cache for search engine icons.
//!
//! Downloaded icon attachments are kept locally, keyed by record id, together
//! with the record revision they were downloaded for. Callers compare that
//! revision against the current record to detect stale copies.
//!
//! # Storage Backends
//!
//! All backends implement the [`AttachmentStore`] trait:
//!
//! - [`InMemoryAttachmentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsAttachmentStore`] -- one data file and one metadata file per record
//!
//! # Resource Handles
//!
//! Attachments are handed to consumers as [`ResourceHandle`]s created by a
//! [`HandleRegistry`]. Every created handle must be released exactly once;
//! the registry tracks live handles so leaks are observable.
//!
//! # Design Rules
//!
//! 1. A stored attachment is replaced wholesale, never patched.
//! 2. Write-then-link: the data file is written before its metadata, so a
//!    metadata file always describes complete bytes.
//! 3. A missing attachment is `Ok(None)`, not an error.
//! 4. The store never interprets attachment contents.

pub mod error;
pub mod fs;
pub mod handle;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsAttachmentStore;
pub use handle::{HandleRegistry, ResourceHandle};
pub use memory::InMemoryAttachmentStore;
pub use traits::{AttachmentStore, CachedAttachment};
