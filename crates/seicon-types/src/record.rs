use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier of a record in the icon collection.
///
/// Ids are assigned by the remote collection. The same id is reused when a
/// record is superseded by a newer revision.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Metadata describing the binary attachment of an [`IconRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    /// MIME type of the attachment bytes, e.g. `image/png`.
    pub mimetype: String,
    /// Hex-encoded BLAKE3 hash of the attachment, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Attachment length in bytes, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Server-side location of the attachment, opaque to this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl AttachmentMeta {
    pub fn new(mimetype: impl Into<String>) -> Self {
        Self {
            mimetype: mimetype.into(),
            hash: None,
            size: None,
            location: None,
        }
    }

    /// Metadata carrying the hash and size of `data`.
    pub fn for_bytes(mimetype: impl Into<String>, data: &[u8]) -> Self {
        Self {
            mimetype: mimetype.into(),
            hash: Some(hash_hex(data)),
            size: Some(data.len() as u64),
            location: None,
        }
    }

    /// Check downloaded bytes against the published size and hash.
    ///
    /// Fields that were not published are not checked.
    pub fn verify(&self, data: &[u8]) -> Result<(), TypeError> {
        if let Some(expected) = self.size {
            let actual = data.len() as u64;
            if actual != expected {
                return Err(TypeError::SizeMismatch { expected, actual });
            }
        }
        if let Some(ref expected) = self.hash {
            let computed = hash_hex(data);
            if !computed.eq_ignore_ascii_case(expected) {
                return Err(TypeError::HashMismatch {
                    expected: expected.clone(),
                    computed,
                });
            }
        }
        Ok(())
    }
}

fn hash_hex(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// One icon published by the remote collection.
///
/// Records are immutable snapshots. A newer revision of the same icon arrives
/// as a new record with the same [`RecordId`] and a larger `last_modified`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconRecord {
    pub id: RecordId,
    /// Exact engine identifiers, or prefixes ending in [`crate::WILDCARD`].
    pub engine_identifiers: Vec<String>,
    /// Icon width in pixels.
    pub image_size: u32,
    pub attachment: AttachmentMeta,
    /// Revision stamp assigned by the collection.
    #[serde(rename = "last_modified")]
    pub last_modified: u64,
}

impl IconRecord {
    pub fn new(
        id: impl Into<RecordId>,
        engine_identifiers: impl IntoIterator<Item = impl Into<String>>,
        image_size: u32,
        attachment: AttachmentMeta,
        last_modified: u64,
    ) -> Self {
        Self {
            id: id.into(),
            engine_identifiers: engine_identifiers.into_iter().map(Into::into).collect(),
            image_size,
            attachment,
            last_modified,
        }
    }

    /// Returns `true` if this record's patterns cover `identifier`.
    pub fn matches(&self, identifier: &str) -> bool {
        crate::matcher::identifier_matches(identifier, &self.engine_identifiers)
    }
}
