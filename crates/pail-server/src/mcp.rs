//! Tool-invocation endpoint.
//!
//! Exposes the gateway's route table as MCP-style tools over JSON-RPC 2.0 at
//! `POST /mcp`. The HTTP transport answers with a JSON body; the SSE transport
//! answers with an event stream carrying a single `message` event.
//!
//! Tool calls run the same operations as the REST handlers, against the same
//! shared state. Nothing here keeps state of its own.

use std::convert::Infallible;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::post;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::api::AppState;
use crate::config::ToolTransport;
use crate::storage::Storage;

mod tools;

pub use tools::{ToolDefinition, definitions};

pub const MCP_PATH: &str = "/mcp";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub fn router<S: Storage>(transport: ToolTransport) -> Router<AppState<S>> {
    match transport {
        ToolTransport::Http => Router::new().route(MCP_PATH, post(handle_http)),
        ToolTransport::Sse => Router::new().route(MCP_PATH, post(handle_sse)),
    }
}

/// Incoming JSON-RPC request. A missing `id` marks a notification.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Error)]
pub enum McpError {
    #[error("parse error")]
    Parse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    fn code(&self) -> i64 {
        match self {
            McpError::Parse => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::Internal(_) => -32603,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            McpError::Internal(_) => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

fn success(id: Value, result: Value) -> (StatusCode, JsonRpcResponse) {
    (
        StatusCode::OK,
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        },
    )
}

fn failure(id: Value, err: McpError) -> (StatusCode, JsonRpcResponse) {
    (
        err.status(),
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code(),
                message: err.to_string(),
            }),
        },
    )
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Parse and run one JSON-RPC message. Notifications yield `None`.
async fn dispatch<S: Storage>(
    state: &AppState<S>,
    body: &[u8],
) -> Option<(StatusCode, JsonRpcResponse)> {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return Some(failure(Value::Null, McpError::Parse)),
    };

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return None;
    };

    if request.jsonrpc != "2.0" {
        return Some(failure(
            id,
            McpError::InvalidRequest("jsonrpc must be \"2.0\"".into()),
        ));
    }

    debug!(method = %request.method, "json-rpc call");
    let result = match request.method.as_str() {
        "initialize" => Ok(initialize_result()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": definitions() })),
        "tools/call" => tools::call(state, request.params).await,
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Some(match result {
        Ok(value) => success(id, value),
        Err(err) => failure(id, err),
    })
}

async fn handle_http<S: Storage>(State(state): State<AppState<S>>, body: Bytes) -> Response {
    match dispatch(&state, &body).await {
        Some((status, response)) => (status, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_sse<S: Storage>(State(state): State<AppState<S>>, body: Bytes) -> Response {
    let Some((_, response)) = dispatch(&state, &body).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let payload = serde_json::to_string(&response).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"serialization failed"}}"#
            .to_string()
    });
    let event = Event::default().event("message").data(payload);
    Sse::new(tokio_stream::once(Ok::<_, Infallible>(event))).into_response()
}
