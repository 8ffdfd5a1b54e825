use thiserror::Error;

use crate::url::UrlType;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("search terms missing from {url_type} url")]
    MissingSearchTerms { url_type: UrlType },

    #[error("invalid engine configuration: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
