//! Foundation types for application-provided search engine icons.
//!
//! This crate provides the record, change-set, and matching types shared by
//! every other `seicon` crate.
//!
//! # Key Types
//!
//! - [`RecordId`] -- Opaque identifier of a record in the icon collection
//! - [`IconRecord`] -- Immutable snapshot of one icon's identity and metadata
//! - [`AttachmentMeta`] -- Mimetype and integrity data for a record's attachment
//! - [`RecordChanges`] -- Created/updated/deleted records pushed by the collection
//! - [`identifier_matches`] -- The single rule binding engine identifiers to records

pub mod changes;
pub mod error;
pub mod matcher;
pub mod record;

pub use changes::{RecordChanges, RecordUpdate};
pub use error::TypeError;
pub use matcher::{identifier_matches, pattern_matches, WILDCARD};
pub use record::{AttachmentMeta, IconRecord, RecordId};
