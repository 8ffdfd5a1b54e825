use thiserror::Error;

/// Attachment integrity failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("attachment hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: String, computed: String },

    #[error("attachment size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}
