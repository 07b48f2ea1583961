use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use tracing::debug;

use crate::config::StorageConfig;

use super::{ObjectEntry, Storage, StorageError};

/// Region S3 treats as the default; buckets there take no location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Storage backed by an S3-compatible engine (MinIO, Garage, AWS, ...).
///
/// The underlying client pools its connections and is safe to share between
/// concurrently running requests.
pub struct S3Storage {
    client: Client,
    region: String,
}

impl S3Storage {
    /// Build a client for the configured endpoint.
    ///
    /// Nothing is sent over the network here, so an unreachable endpoint only
    /// shows up on the first call.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.expose().to_string(),
            None,
            None,
            "pail-static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();

        Self {
            client: Client::from_conf(s3_config),
            region: config.region.clone(),
        }
    }
}

/// Map an SDK failure onto a storage error, keeping the engine's code and message.
fn engine_error<E, R>(err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return StorageError::Unreachable(DisplayErrorContext(&err).to_string());
    }

    match (err.code(), err.message()) {
        (Some(code), Some(message)) => StorageError::engine(code, message),
        (Some(code), None) => StorageError::engine(code, "no message returned"),
        _ => StorageError::Engine(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        debug!(bucket, "head bucket");
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found()) =>
            {
                Ok(false)
            }
            Err(err) => Err(engine_error(err)),
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(engine_error)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(engine_error)?;
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(engine_error)?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        recursive: bool,
    ) -> Result<Vec<ObjectEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if !recursive {
                request = request.delimiter("/");
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(engine_error)?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    let size = object.size().and_then(|s| u64::try_from(s).ok());
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        size,
                        is_prefix: false,
                    });
                }
            }
            for common in output.common_prefixes() {
                if let Some(key) = common.prefix() {
                    entries.push(ObjectEntry::prefix(key));
                }
            }

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        // Pages interleave objects and common prefixes; present one ordered listing.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(bucket, ?prefix, recursive, count = entries.len(), "listed objects");
        Ok(entries)
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StorageError> {
        let length = i64::try_from(data.len())
            .map_err(|_| StorageError::Engine("object too large".into()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(length)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(engine_error)?;
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(engine_error)?;
        Ok(())
    }
}
