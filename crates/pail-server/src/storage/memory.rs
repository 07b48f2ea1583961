use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ObjectEntry, Storage, StorageError};

type Bucket = BTreeMap<String, Bytes>;

/// In-process object store with S3 semantics.
///
/// Buckets and keys are kept sorted, so listings come back in the same
/// lexicographic order an S3 engine returns them.
#[derive(Default)]
pub struct MemoryStorage {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn no_such_bucket() -> StorageError {
    StorageError::engine("NoSuchBucket", "The specified bucket does not exist")
}

/// Turn the keys under `prefix` into listing entries, collapsing anything
/// below the next `/` into one common prefix unless `recursive` is set.
///
/// `keys` must be sorted and start at `prefix`.
fn fold_listing<'a>(
    keys: impl Iterator<Item = (&'a String, &'a Bytes)>,
    prefix: &str,
    recursive: bool,
) -> Vec<ObjectEntry> {
    let mut entries: Vec<ObjectEntry> = Vec::new();

    for (key, data) in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            break;
        };

        if !recursive && let Some(slash) = rest.find('/') {
            let common = format!("{prefix}{}", &rest[..=slash]);
            if entries.last().map(|e| e.key.as_str()) != Some(common.as_str()) {
                entries.push(ObjectEntry::prefix(common));
            }
            continue;
        }

        entries.push(ObjectEntry::object(key.clone(), data.len() as u64));
    }

    entries
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Err(StorageError::engine(
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it.",
            ));
        }
        buckets.insert(bucket.to_string(), Bucket::new());
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        match buckets.get(bucket) {
            None => Err(no_such_bucket()),
            Some(objects) if !objects.is_empty() => Err(StorageError::engine(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            )),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StorageError> {
        let buckets = self.buckets.read().await;
        let objects = buckets.get(bucket).ok_or_else(no_such_bucket)?;
        let prefix = prefix.unwrap_or("");
        let keys = objects.range(prefix.to_string()..);
        Ok(fold_listing(keys, prefix, recursive))
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(no_such_bucket)?;
        // Removing an absent key succeeds on S3 too
        objects.remove(key);
        Ok(())
    }
}
