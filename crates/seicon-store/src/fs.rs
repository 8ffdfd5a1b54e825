//! Filesystem attachment store.
//!
//! Layout under the store root, per record id:
//!
//! - `<hex(id)>.bin` -- the attachment bytes
//! - `<hex(id)>.json` -- the [`IconRecord`] the bytes were downloaded for
//!
//! Record ids are opaque, so file names carry the hex encoding of the id and
//! the id itself lives only in the metadata.
//!
//! Both files are written to a temporary name and renamed into place. The
//! metadata file is renamed last, so its presence means the bytes are complete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use seicon_types::{IconRecord, RecordId};
use tokio::fs;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{AttachmentStore, CachedAttachment};

/// Attachment store backed by a directory.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    /// Open a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paths(&self, id: &RecordId) -> StoreResult<(PathBuf, PathBuf)> {
        if id.as_str().is_empty() {
            return Err(StoreError::InvalidId(id.clone()));
        }
        let stem = hex::encode(id.as_str());
        Ok((
            self.root.join(format!("{stem}.bin")),
            self.root.join(format!("{stem}.json")),
        ))
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn get(&self, id: &RecordId) -> StoreResult<Option<CachedAttachment>> {
        let (data_path, meta_path) = self.paths(id)?;

        let meta = match fs::read(&meta_path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: IconRecord = serde_json::from_slice(&meta)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if record.id != *id {
            return Err(StoreError::Corrupt {
                id: id.clone(),
                reason: format!("metadata describes record {}", record.id),
            });
        }

        let data = match fs::read(&data_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Corrupt {
                    id: id.clone(),
                    reason: "metadata present but data file missing".into(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CachedAttachment {
            record,
            bytes: Bytes::from(data),
        }))
    }

    async fn put(&self, attachment: CachedAttachment) -> StoreResult<()> {
        let (data_path, meta_path) = self.paths(&attachment.record.id)?;
        let meta = serde_json::to_vec(&attachment.record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.root).await?;
        write_atomic(&data_path, &attachment.bytes).await?;
        write_atomic(&meta_path, &meta).await?;

        debug!(
            record_id = %attachment.record.id,
            bytes = attachment.bytes.len(),
            "attachment stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seicon_types::AttachmentMeta;

    fn attachment(id: &str, last_modified: u64, data: &'static [u8]) -> CachedAttachment {
        let record = IconRecord::new(
            id,
            ["shop*"],
            32,
            AttachmentMeta::for_bytes("image/png", data),
            last_modified,
        );
        CachedAttachment::new(record, data)
    }

    #[tokio::test]
    async fn put_and_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path().join("icons"));
        store.put(attachment("a", 7, b"png-bytes")).await.unwrap();

        let reopened = FsAttachmentStore::new(dir.path().join("icons"));
        let read_back = reopened.get(&RecordId::new("a")).await.unwrap().expect("should exist");
        assert_eq!(&read_back.bytes[..], b"png-bytes");
        assert_eq!(read_back.record.last_modified, 7);
        assert_eq!(read_back.record.engine_identifiers, vec!["shop*"]);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        assert!(store.get(&RecordId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_revision() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        store.put(attachment("a", 1, b"old")).await.unwrap();
        store.put(attachment("a", 2, b"new")).await.unwrap();

        let read_back = store.get(&RecordId::new("a")).await.unwrap().unwrap();
        assert_eq!(&read_back.bytes[..], b"new");
        assert_eq!(read_back.record.last_modified, 2);
    }

    #[tokio::test]
    async fn missing_data_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        store.put(attachment("a", 1, b"icon")).await.unwrap();
        std::fs::remove_file(dir.path().join(format!("{}.bin", hex::encode("a")))).unwrap();

        let err = store.get(&RecordId::new("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn opaque_ids_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path().join("icons"));
        for id in ["icons/shop.v2", "../escape", "ünïcode id"] {
            store.put(attachment(id, 4, b"icon")).await.unwrap();
            let read_back = store.get(&RecordId::new(id)).await.unwrap().unwrap();
            assert_eq!(read_back.record.id.as_str(), id);
            assert_eq!(&read_back.bytes[..], b"icon");
        }
        assert!(!dir.path().join("escape.bin").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("icons")).unwrap().count(), 6);
    }

    #[tokio::test]
    async fn rejects_empty_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAttachmentStore::new(dir.path());
        let err = store.get(&RecordId::new("")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
