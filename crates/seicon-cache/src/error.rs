use seicon_remote::RemoteError;
use seicon_types::RecordId;

/// Failure modes of icon resolution and refresh.
///
/// None of these escape to callers of [`crate::IconHandler::get_icon`]; they
/// are logged and reported through [`crate::FlushReport`].
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// The icon list could not be fetched; the index degrades to empty.
    #[error("failed to load icon list: {0}")]
    Load(#[from] RemoteError),

    /// No attachment is cached locally for the selected record.
    #[error("no attachment cached for record {record_id}")]
    AttachmentMissing { record_id: RecordId },

    /// The cached attachment belongs to an older revision of the record.
    #[error("cached attachment for record {record_id} is revision {cached}, current is {current}")]
    AttachmentStale {
        record_id: RecordId,
        cached: u64,
        current: u64,
    },

    /// A flush could not download or verify an attachment.
    #[error("download of record {record_id} failed: {reason}")]
    DownloadFailed { record_id: RecordId, reason: String },

    /// A downloaded attachment could not be written to the local cache.
    #[error("caching record {record_id} failed: {reason}")]
    CacheWriteFailed { record_id: RecordId, reason: String },

    /// No record matches the engine identifier.
    #[error("no icon found for {identifier}")]
    NoMatch { identifier: String },
}
