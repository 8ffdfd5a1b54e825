use seicon_types::RecordId;

/// Errors from attachment store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record id cannot be used as a storage key.
    #[error("invalid record id: {0:?}")]
    InvalidId(RecordId),

    /// Attachment metadata could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading or writing the cache directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored metadata does not describe the stored bytes.
    #[error("corrupt attachment {id}: {reason}")]
    Corrupt { id: RecordId, reason: String },
}

/// Result of an attachment store call.
pub type StoreResult<T> = Result<T, StoreError>;
