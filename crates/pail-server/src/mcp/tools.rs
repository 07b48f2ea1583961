use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::{ApiError, AppState, Operation};
use crate::mcp::McpError;
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One tool per route, in route-table order.
pub fn definitions() -> Vec<ToolDefinition> {
    Operation::ALL
        .into_iter()
        .map(|op| ToolDefinition {
            name: op.name(),
            description: format!("{} ({} {}, {})", op.summary(), op.method(), op.path(), op.tag()),
            input_schema: input_schema(op),
        })
        .collect()
}

fn string_props(fields: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

fn input_schema(op: Operation) -> Value {
    match op {
        Operation::ReadRoot | Operation::HealthCheck | Operation::ListBuckets => {
            json!({ "type": "object", "properties": {} })
        }
        Operation::CreateBucket | Operation::DeleteBucket | Operation::ListFilenames => {
            string_props(&[("bucket_name", "Name of the bucket")])
        }
        Operation::UploadFile => string_props(&[
            ("bucket_name", "Name of the target bucket"),
            ("filename", "Object key to store the file under"),
            ("content", "File contents, base64 encoded"),
        ]),
        Operation::DeleteFile => string_props(&[
            ("bucket_name", "Name of the bucket"),
            ("file_name", "Object key to delete"),
        ]),
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct BucketArgs {
    bucket_name: String,
}

#[derive(Debug, Deserialize)]
struct UploadArgs {
    bucket_name: String,
    filename: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct DeleteFileArgs {
    bucket_name: String,
    file_name: String,
}

fn arguments<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|err| McpError::InvalidParams(err.to_string()))
}

/// Serialize a successful operation result, leaving operation failures in place.
fn payload<T: Serialize>(result: Result<T, ApiError>) -> Result<Result<Value, ApiError>, McpError> {
    match result {
        Ok(value) => serde_json::to_value(value)
            .map(Ok)
            .map_err(|err| McpError::Internal(err.to_string())),
        Err(err) => Ok(Err(err)),
    }
}

async fn run<S: Storage>(
    state: &AppState<S>,
    op: Operation,
    args: Value,
) -> Result<Result<Value, ApiError>, McpError> {
    match op {
        Operation::ReadRoot => payload(Ok(state.root())),
        Operation::HealthCheck => payload(Ok(state.check_health().await)),
        Operation::ListBuckets => payload(state.list_buckets().await),
        Operation::CreateBucket => {
            let args: BucketArgs = arguments(args)?;
            payload(state.create_bucket(&args.bucket_name).await)
        }
        Operation::DeleteBucket => {
            let args: BucketArgs = arguments(args)?;
            payload(state.delete_bucket(&args.bucket_name).await)
        }
        Operation::ListFilenames => {
            let args: BucketArgs = arguments(args)?;
            payload(state.list_files(&args.bucket_name).await)
        }
        Operation::UploadFile => {
            let args: UploadArgs = arguments(args)?;
            let data = BASE64
                .decode(args.content.as_bytes())
                .map_err(|err| McpError::InvalidParams(format!("content is not base64: {err}")))?;
            payload(
                state
                    .upload_file(&args.bucket_name, &args.filename, Bytes::from(data))
                    .await,
            )
        }
        Operation::DeleteFile => {
            let args: DeleteFileArgs = arguments(args)?;
            payload(state.delete_file(&args.bucket_name, &args.file_name).await)
        }
    }
}

/// Handle `tools/call`. Operation failures come back as a tool result with
/// `isError` set, carrying the HTTP status the REST route would have used.
pub(super) async fn call<S: Storage>(
    state: &AppState<S>,
    params: Option<Value>,
) -> Result<Value, McpError> {
    let params: ToolCallParams = arguments(params.unwrap_or(Value::Null))?;
    let op = Operation::from_name(&params.name)
        .ok_or_else(|| McpError::InvalidParams(format!("unknown tool: {}", params.name)))?;

    let (body, is_error) = match run(state, op, params.arguments).await? {
        Ok(value) => (value, false),
        Err(err) => (
            json!({ "status": err.status().as_u16(), "detail": err.to_string() }),
            true,
        ),
    };

    Ok(json!({
        "content": [{ "type": "text", "text": body.to_string() }],
        "isError": is_error,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::storage::MemoryStorage;

    fn state() -> AppState<MemoryStorage> {
        AppState {
            storage: Arc::new(MemoryStorage::new()),
            health_timeout: Duration::from_secs(1),
        }
    }

    fn text(result: &Value) -> Value {
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    async fn invoke(state: &AppState<MemoryStorage>, name: &str, arguments: Value) -> Value {
        call(state, Some(json!({ "name": name, "arguments": arguments })))
            .await
            .unwrap()
    }

    #[test]
    fn every_route_is_a_tool() {
        let tools = definitions();
        assert_eq!(tools.len(), Operation::ALL.len());
        let upload = tools.iter().find(|t| t.name == "upload_file").unwrap();
        assert_eq!(
            upload.input_schema["required"],
            json!(["bucket_name", "filename", "content"])
        );
        assert!(upload.description.contains("POST /file"));
    }

    #[tokio::test]
    async fn create_then_list_buckets() {
        let state = state();
        let result = invoke(&state, "create_bucket", json!({"bucket_name": "docs"})).await;
        assert_eq!(result["isError"], false);
        assert_eq!(
            text(&result),
            json!({"message": "Bucket 'docs' created successfully."})
        );

        let result = invoke(&state, "list_buckets", Value::Null).await;
        assert_eq!(text(&result), json!({"buckets": ["docs"]}));
    }

    #[tokio::test]
    async fn operation_failures_are_tool_errors() {
        let state = state();
        let result = invoke(&state, "delete_bucket", json!({"bucket_name": "ghost"})).await;
        assert_eq!(result["isError"], true);
        assert_eq!(
            text(&result),
            json!({"status": 404, "detail": "Bucket 'ghost' does not exist."})
        );
    }

    #[tokio::test]
    async fn upload_decodes_base64_content() {
        let state = state();
        invoke(&state, "create_bucket", json!({"bucket_name": "docs"})).await;
        let result = invoke(
            &state,
            "upload_file",
            json!({"bucket_name": "docs", "filename": "hello.txt", "content": BASE64.encode("hello")}),
        )
        .await;
        assert_eq!(text(&result), json!({"filename": "hello.txt"}));

        let entries = state.storage.list_objects("docs", None, true).await.unwrap();
        assert_eq!(entries[0].key, "hello.txt");
        assert_eq!(entries[0].size, Some(5));
    }

    #[tokio::test]
    async fn bad_arguments_are_invalid_params() {
        let state = state();
        let err = call(&state, Some(json!({"name": "create_bucket", "arguments": {}})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));

        let err = call(&state, Some(json!({"name": "format_disk"})))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));

        let err = call(
            &state,
            Some(json!({"name": "upload_file", "arguments": {"bucket_name": "b", "filename": "f", "content": "%%%"}})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}
