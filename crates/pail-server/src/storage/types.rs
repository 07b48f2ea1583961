use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine rejected or failed the call. The message is the engine's own.
    #[error("{0}")]
    Engine(String),

    /// The engine could not be reached at all.
    #[error("storage endpoint unreachable: {0}")]
    Unreachable(String),
}

impl StorageError {
    /// Build an engine error in the same shape S3 error responses are reported.
    pub fn engine(code: &str, message: &str) -> Self {
        StorageError::Engine(format!(
            "S3 operation failed; code: {code}, message: {message}"
        ))
    }
}

/// One entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: Option<u64>,
    /// True for common-prefix entries produced by non-recursive listings
    pub is_prefix: bool,
}

impl ObjectEntry {
    pub fn object(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size: Some(size),
            is_prefix: false,
        }
    }

    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            is_prefix: true,
        }
    }
}
