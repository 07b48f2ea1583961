use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::config::{DEFAULT_HEALTH_TIMEOUT, ToolTransportConfig};
use crate::storage::Storage;

mod buckets;
mod error;
mod files;
mod health;
mod routes;

pub use buckets::{BucketListResponse, BucketRequest};
pub use error::{ApiError, ErrorResponse};
pub use files::{DeleteFileForm, FileListResponse, FilenamesQuery, UploadResponse};
pub use health::{HealthResponse, RootResponse};
pub use routes::Operation;

pub struct AppState<S: Storage> {
    pub storage: Arc<S>,
    pub health_timeout: Duration,
}

impl<S: Storage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            health_timeout: self.health_timeout,
        }
    }
}

/// Confirmation payload shared by the mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Upper bound on the health probe's bucket listing
    pub health_timeout: Duration,
    /// Tool-invocation endpoint; `None` leaves it unmounted
    pub tools: Option<ToolTransportConfig>,
    /// Request body cap in bytes, covering uploads and tool calls; `None` lifts it
    pub max_upload: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            tools: None,
            max_upload: None,
        }
    }
}

/// Build the gateway's router over `storage`.
///
/// The caller owns the returned router and decides how to serve it.
pub fn router<S: Storage>(storage: S, config: &ApiConfig) -> Router {
    let state = AppState {
        storage: Arc::new(storage),
        health_timeout: config.health_timeout,
    };

    let mut app = Operation::ALL
        .iter()
        .fold(Router::new(), |app, op| {
            app.route(op.path(), routes::method_router::<S>(*op))
        });

    if let Some(tools) = config.tools.filter(|tools| tools.enabled) {
        app = app.merge(crate::mcp::router::<S>(tools.transport));
    }

    let body_limit = match config.max_upload {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    app.with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ToolTransport;
    use crate::storage::MemoryStorage;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_reports_ok() {
        let app = router(MemoryStorage::new(), &ApiConfig::default());
        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn bucket_lifecycle_scenario() {
        let app = router(MemoryStorage::new(), &ApiConfig::default());

        let (status, body) =
            send(&app, json_request("POST", "/bucket", json!({"bucket_name": "a"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Bucket 'a' created successfully."}));

        let (_, body) = send(&app, get("/bucketnames")).await;
        assert_eq!(body, json!({"buckets": ["a"]}));

        let (status, body) =
            send(&app, json_request("DELETE", "/bucket", json!({"bucket_name": "a"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Bucket 'a' deleted successfully."}));

        let (_, body) = send(&app, get("/bucketnames")).await;
        assert_eq!(body, json!({"buckets": []}));
    }

    #[tokio::test]
    async fn duplicate_bucket_is_reported_as_not_found() {
        let app = router(MemoryStorage::new(), &ApiConfig::default());
        send(&app, json_request("POST", "/bucket", json!({"bucket_name": "dup"}))).await;

        let (status, body) =
            send(&app, json_request("POST", "/bucket", json!({"bucket_name": "dup"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Bucket 'dup' already exists.");

        let (_, body) = send(&app, get("/bucketnames")).await;
        assert_eq!(body, json!({"buckets": ["dup"]}));
    }

    #[tokio::test]
    async fn listing_files_of_missing_bucket_is_not_found() {
        let app = router(MemoryStorage::new(), &ApiConfig::default());
        let (status, body) = send(&app, get("/filenames?bucket_name=ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Bucket 'ghost' does not exist.");
    }

    #[tokio::test]
    async fn tool_endpoint_is_only_mounted_when_enabled() {
        let call = || json_request("POST", "/mcp", json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));

        let app = router(MemoryStorage::new(), &ApiConfig::default());
        let (status, _) = send(&app, call()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let disabled = ApiConfig {
            tools: Some(ToolTransportConfig::disabled()),
            ..ApiConfig::default()
        };
        let app = router(MemoryStorage::new(), &disabled);
        let (status, _) = send(&app, call()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let enabled = ApiConfig {
            tools: Some(ToolTransportConfig {
                enabled: true,
                transport: ToolTransport::Http,
            }),
            ..ApiConfig::default()
        };
        let app = router(MemoryStorage::new(), &enabled);
        let (status, body) = send(&app, call()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], json!({}));
    }
}
