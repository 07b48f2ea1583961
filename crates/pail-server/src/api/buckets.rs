use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiError, AppState, MessageResponse};
use crate::storage::Storage;

/// Request body for bucket operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRequest {
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketListResponse {
    pub buckets: Vec<String>,
}

impl<S: Storage> AppState<S> {
    pub async fn list_buckets(&self) -> Result<BucketListResponse, ApiError> {
        let buckets = self.storage.list_buckets().await?;
        Ok(BucketListResponse { buckets })
    }

    /// Create `bucket` unless it already exists.
    pub async fn create_bucket(&self, bucket: &str) -> Result<MessageResponse, ApiError> {
        if self.storage.bucket_exists(bucket).await? {
            return Err(ApiError::BucketExists(bucket.to_string()));
        }

        self.storage.make_bucket(bucket).await?;
        info!(bucket, "created bucket");
        Ok(MessageResponse::new(format!(
            "Bucket '{bucket}' created successfully."
        )))
    }

    /// Delete `bucket` if it exists. A non-empty bucket is refused by the engine.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<MessageResponse, ApiError> {
        if !self.storage.bucket_exists(bucket).await? {
            return Err(ApiError::BucketMissing(bucket.to_string()));
        }

        self.storage.remove_bucket(bucket).await?;
        info!(bucket, "deleted bucket");
        Ok(MessageResponse::new(format!(
            "Bucket '{bucket}' deleted successfully."
        )))
    }
}

/// GET /bucketnames - List all bucket names
pub(super) async fn get_bucketnames<S: Storage>(
    State(state): State<AppState<S>>,
) -> Result<Json<BucketListResponse>, ApiError> {
    state.list_buckets().await.map(Json)
}

/// POST /bucket - Create a bucket
pub(super) async fn post_bucket<S: Storage>(
    State(state): State<AppState<S>>,
    Json(req): Json<BucketRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.create_bucket(&req.bucket_name).await.map(Json)
}

/// DELETE /bucket - Delete a bucket
pub(super) async fn delete_bucket<S: Storage>(
    State(state): State<AppState<S>>,
    Json(req): Json<BucketRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.delete_bucket(&req.bucket_name).await.map(Json)
}
