use seicon_types::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("collection unavailable: {0}")]
    Unavailable(String),

    #[error("attachment not found for record {0}")]
    AttachmentNotFound(RecordId),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
