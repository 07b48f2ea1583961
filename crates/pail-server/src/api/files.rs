use axum::extract::multipart::MultipartRejection;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{ApiError, AppState, MessageResponse};
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenamesQuery {
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

/// Result of an upload.
///
/// Uploading into a missing bucket is answered with a message rather than an
/// error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Stored { filename: String },
    BucketMissing { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileForm {
    pub bucket_name: String,
    pub file_name: String,
}

impl<S: Storage> AppState<S> {
    /// List the top level of `bucket`; nested keys show up as `dir/` prefixes.
    pub async fn list_files(&self, bucket: &str) -> Result<FileListResponse, ApiError> {
        if !self.storage.bucket_exists(bucket).await? {
            return Err(ApiError::BucketMissing(bucket.to_string()));
        }

        let entries = self.storage.list_objects(bucket, None, false).await?;
        Ok(FileListResponse {
            files: entries.into_iter().map(|entry| entry.key).collect(),
        })
    }

    /// The soft answer for an upload into `bucket`, if the bucket is missing.
    async fn upload_bucket_missing(&self, bucket: &str) -> Result<Option<UploadResponse>, ApiError> {
        let exists = self
            .storage
            .bucket_exists(bucket)
            .await
            .map_err(ApiError::upload)?;

        Ok((!exists).then(|| UploadResponse::BucketMissing {
            message: format!("Bucket '{bucket}' does not exist."),
        }))
    }

    /// Store `data` under `filename`. Every engine failure on this path is an
    /// upload failure.
    pub async fn upload_file(
        &self,
        bucket: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<UploadResponse, ApiError> {
        if let Some(missing) = self.upload_bucket_missing(bucket).await? {
            debug!(bucket, filename, "upload into missing bucket");
            return Ok(missing);
        }

        let size = data.len();
        self.storage
            .put_object(bucket, filename, data)
            .await
            .map_err(ApiError::upload)?;

        info!(bucket, filename, size, "stored object");
        Ok(UploadResponse::Stored {
            filename: filename.to_string(),
        })
    }

    /// Delete `file` from `bucket` after confirming it is listed there.
    ///
    /// Existence is checked by listing the keys that start with `file` and
    /// looking for an exact match, so the cost grows with the number of keys
    /// sharing that prefix.
    pub async fn delete_file(&self, bucket: &str, file: &str) -> Result<MessageResponse, ApiError> {
        if !self.storage.bucket_exists(bucket).await? {
            return Err(ApiError::BucketMissing(bucket.to_string()));
        }

        let candidates = self.storage.list_objects(bucket, Some(file), false).await?;
        if !candidates.iter().any(|entry| entry.key == file) {
            return Err(ApiError::FileMissing {
                bucket: bucket.to_string(),
                file: file.to_string(),
            });
        }

        self.storage.remove_object(bucket, file).await?;
        info!(bucket, file, "deleted object");
        Ok(MessageResponse::new(format!(
            "File '{file}' deleted successfully from bucket '{bucket}'."
        )))
    }
}

/// GET /filenames?bucket_name= - List files in a bucket
pub(super) async fn get_filenames<S: Storage>(
    State(state): State<AppState<S>>,
    Query(query): Query<FilenamesQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    state.list_files(&query.bucket_name).await.map(Json)
}

/// POST /file - Upload a file (multipart: `bucket_name` text, `file` binary)
pub(super) async fn post_file<S: Storage>(
    State(state): State<AppState<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(ApiError::upload)?;

    let mut bucket_name: Option<String> = None;
    let mut upload: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(ApiError::upload)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("bucket_name") => {
                bucket_name = Some(field.text().await.map_err(ApiError::upload)?);
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(ApiError::upload)?;
                upload = Some((filename, data));
            }
            _ => {}
        }
    }

    let bucket_name = bucket_name
        .ok_or_else(|| ApiError::InvalidRequest("Field required: bucket_name".into()))?;
    let file = match upload {
        Some((Some(filename), data)) => Ok((filename, data)),
        Some((None, _)) => Err(ApiError::upload("Uploaded file has no filename")),
        None => Err(ApiError::upload("No file part in upload")),
    };

    // A missing bucket is reported before a malformed file part
    let (filename, data) = match file {
        Ok(file) => file,
        Err(err) => {
            return match state.upload_bucket_missing(&bucket_name).await? {
                Some(missing) => Ok(Json(missing)),
                None => Err(err),
            };
        }
    };

    state
        .upload_file(&bucket_name, &filename, data)
        .await
        .map(Json)
}

/// Accepts the fields either urlencoded or as multipart text parts.
impl<S: Send + Sync> FromRequest<S> for DeleteFileForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<DeleteFileForm>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

        let mut bucket_name = None;
        let mut file_name = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::InvalidRequest(err.body_text()))?
        {
            let slot = match field.name() {
                Some("bucket_name") => &mut bucket_name,
                Some("file_name") => &mut file_name,
                _ => continue,
            };
            *slot = Some(
                field
                    .text()
                    .await
                    .map_err(|err| ApiError::InvalidRequest(err.body_text()))?,
            );
        }

        Ok(DeleteFileForm {
            bucket_name: bucket_name
                .ok_or_else(|| ApiError::InvalidRequest("Field required: bucket_name".into()))?,
            file_name: file_name
                .ok_or_else(|| ApiError::InvalidRequest("Field required: file_name".into()))?,
        })
    }
}

/// DELETE /file - Delete a file (form: `bucket_name`, `file_name`)
pub(super) async fn delete_file<S: Storage>(
    State(state): State<AppState<S>>,
    form: DeleteFileForm,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .delete_file(&form.bucket_name, &form.file_name)
        .await
        .map(Json)
}
