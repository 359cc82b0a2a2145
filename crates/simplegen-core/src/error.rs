//! Store error type.

use thiserror::Error;

/// Errors raised by the model store and request log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a store file failed.
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A store file or record is not valid JSON.
    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("request log entry not found: {0}")]
    LogEntryNotFound(u64),

    /// Model names must be non-empty and free of surrounding whitespace.
    #[error("invalid model name: {0:?}")]
    InvalidName(String),
}
