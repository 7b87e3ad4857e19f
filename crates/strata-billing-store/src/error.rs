//! Error types for strata-billing storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// These are always propagated unchanged to the caller. In particular a
/// failed read is never reported as an absent record: lookups that can
/// legitimately find nothing return `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("store operation failed: {0}")]
    Database(String),

    /// A record could not be encoded for storage.
    #[error("encode failure: {0}")]
    Encode(String),

    /// A stored record could not be decoded.
    #[error("decode failure: {0}")]
    Decode(String),
}
