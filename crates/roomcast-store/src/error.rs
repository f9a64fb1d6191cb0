//! Error types for the storage layer.

/// Errors that can occur while persisting or reading messages.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the write. Nothing was recorded.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer within the configured deadline.
    /// Ambiguous by nature — the relay never retries automatically, so
    /// an ambiguous write can't turn into a duplicate record.
    #[error("store operation timed out")]
    Timeout,
}
