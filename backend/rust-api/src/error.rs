use thiserror::Error;

/// Failures the progress endpoints can surface to callers.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Caller supplied a level name outside the fixed sequence.
    #[error("Unknown level: {0}")]
    InvalidLevel(String),

    /// Backing store unreachable or the operation was rejected after the
    /// adapter's bounded retries.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
