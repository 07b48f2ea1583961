use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::AppState;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub alive: bool,
}

impl<S: Storage> AppState<S> {
    pub fn root(&self) -> RootResponse {
        RootResponse {
            status: "ok".into(),
            message: "pail object gateway".into(),
        }
    }

    /// Probe the engine with a bucket listing bounded by the health timeout.
    ///
    /// Never fails: an expired probe or an engine error both read as not alive.
    pub async fn check_health(&self) -> HealthResponse {
        let probe = tokio::time::timeout(self.health_timeout, self.storage.list_buckets()).await;
        let alive = match probe {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                warn!(%err, "health probe failed");
                false
            }
            Err(_) => {
                warn!(timeout = ?self.health_timeout, "health probe timed out");
                false
            }
        };
        HealthResponse { alive }
    }
}

/// GET / - Banner
pub(super) async fn get_root<S: Storage>(State(state): State<AppState<S>>) -> Json<RootResponse> {
    Json(state.root())
}

/// GET /healthy - Storage liveness
pub(super) async fn get_healthy<S: Storage>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    Json(state.check_health().await)
}
