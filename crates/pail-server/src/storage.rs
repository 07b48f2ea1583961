use async_trait::async_trait;
use bytes::Bytes;

mod memory;
mod s3;
mod types;

pub use memory::MemoryStorage;
pub use s3::S3Storage;
pub use types::{ObjectEntry, StorageError};

/// The object-store operations the gateway forwards to.
///
/// Every method maps to a single call against the engine. Errors carry the
/// engine's own message so the HTTP layer can pass it through untouched.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Buckets ---

    /// Check whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    /// List all bucket names, in the order the engine returns them.
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError>;

    /// Create a bucket. Creating one that already exists is an engine error.
    async fn make_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Remove an empty bucket.
    async fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    // --- Objects ---

    /// List objects under `prefix`.
    ///
    /// When `recursive` is false, keys containing a `/` past the prefix are
    /// folded into a single common-prefix entry ending in `/`, like a
    /// directory listing.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StorageError>;

    /// Store an object. `data.len()` is sent as the content length.
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError>;

    /// Remove an object.
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
