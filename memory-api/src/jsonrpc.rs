//! JSON-RPC 2.0 dispatch for the agent-facing tool surface:
//! `initialize`, `tools/list`, `tools/call`, `resources/list`,
//! `resources/read`. Framing (decoding the HTTP body into a `Request`,
//! writing the `Response` back out) is the caller's job — this module
//! is purely the dispatch table.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use memory_activity::ActivityRepository;
use memory_core::{MemoryRepository, UserId};

use crate::error::{jsonrpc_code, ApiError};
use crate::ops::{self, SearchArgs, StoreArgs, UpdateArgs};
use crate::state::AppState;
use crate::tool_catalog::{self, TOOLS};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "memory-service";

#[derive(Clone, Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

fn ok(id: Value, result: Value) -> Response {
    Response { jsonrpc: "2.0", id, result: Some(result), error: None }
}

fn err(id: Value, code: i64, message: impl Into<String>) -> Response {
    Response { jsonrpc: "2.0", id, error: Some(RpcError { code, message: message.into() }), result: None }
}

fn parse_store_args(v: &Value) -> Result<StoreArgs, ApiError> {
    Ok(StoreArgs {
        content: v.get("content").and_then(Value::as_str).unwrap_or_default().to_string(),
        category: v.get("category").and_then(Value::as_str).map(str::to_string),
        memory_type: v.get("type").and_then(Value::as_str).map(str::to_string),
        priority: v.get("priority").and_then(Value::as_str).map(str::to_string),
        update_key: v.get("update_key").and_then(Value::as_str).map(str::to_string),
        tags: v.get("tags").and_then(Value::as_array).map(|arr| {
            arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect()
        }),
        metadata: v.get("metadata").cloned(),
    })
}

fn parse_update_args(v: &Value) -> Result<UpdateArgs, ApiError> {
    Ok(UpdateArgs {
        content: v.get("content").and_then(Value::as_str).map(str::to_string),
        category: v.get("category").and_then(Value::as_str).map(str::to_string),
        memory_type: v.get("type").and_then(Value::as_str).map(str::to_string),
        priority: v.get("priority").and_then(Value::as_str).map(str::to_string),
        tags: v.get("tags").and_then(Value::as_array).map(|arr| {
            arr.iter().filter_map(|t| t.as_str().map(str::to_string)).collect()
        }),
        metadata: v.get("metadata").cloned(),
    })
}

fn parse_search_args(v: &Value) -> Result<SearchArgs, ApiError> {
    Ok(SearchArgs {
        query: v.get("query").and_then(Value::as_str).unwrap_or_default().to_string(),
        category: v.get("category").and_then(Value::as_str).map(str::to_string),
        memory_type: v.get("type").and_then(Value::as_str).map(str::to_string),
        limit: v.get("limit").and_then(Value::as_i64),
        use_semantic: v.get("use_semantic").and_then(Value::as_bool),
    })
}

fn parse_uuid(v: &Value, field: &str) -> Result<Uuid, ApiError> {
    v.get(field)
    .and_then(Value::as_str)
    .and_then(|s| Uuid::parse_str(s).ok())
    .ok_or_else(|| ApiError::Validation { field: field.to_string(), reason: "must be a UUID string".to_string() })
}

/// Dispatch one already-decoded request. `arguments` is required and
/// non-empty for every `tools/call`.
pub async fn handle<R, A>(state: &AppState<R, A>, user_id: UserId, req: Request) -> Response
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    match req.method.as_str() {
        "initialize" => ok(
            req.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
                "capabilities": { "tools": {}, "resources": {} }
            }),
        ),

        "tools/list" => {
            let tools: Vec<Value> = TOOLS
                .iter()
                .map(|t| json!({ "name": t.name, "description": t.description, "inputSchema": (t.input_schema)() }))
                .collect();
            ok(req.id, json!({ "tools": tools }))
        }

        "tools/call" => handle_tools_call(state, user_id, req).await,

        "resources/list" => ok(
            req.id,
            json!({
                "resources": [
                    { "uri": "memory://stats", "name": "Memory statistics", "mimeType": "application/json" }
                ]
            }),
        ),

        "resources/read" => {
            let uri = req.params.get("uri").and_then(Value::as_str).unwrap_or_default();
            if uri != "memory://stats" {
                return err(req.id, jsonrpc_code::INVALID_PARAMS, format!("unknown resource: {uri}"));
            }
            let count = match state.core.count(user_id).await {
                Ok(c) => c,
                Err(e) => {
                    let api_err: ApiError = e.into();
                    return err(req.id, api_err.jsonrpc_code(), api_err.public_message());
                }
            };
            ok(
                req.id,
                json!({ "contents": [{ "uri": uri, "mimeType": "application/json", "text": json!({ "memory_count": count }).to_string() }] }),
            )
        }

        other => err(req.id, jsonrpc_code::METHOD_NOT_FOUND, format!("unknown method: {other}")),
    }
}

async fn handle_tools_call<R, A>(state: &AppState<R, A>, user_id: UserId, req: Request) -> Response
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let Some(name) = req.params.get("name").and_then(Value::as_str) else {
        return err(req.id, jsonrpc_code::INVALID_PARAMS, "missing tool name");
    };

    let arguments = req.params.get("arguments").cloned().unwrap_or(Value::Null);
    if !arguments.is_object() || arguments.as_object().is_some_and(|m| m.is_empty()) {
        return err(req.id, jsonrpc_code::INVALID_PARAMS, "arguments must be a non-empty object");
    }

    if tool_catalog::find(name).is_none() {
        return err(req.id, jsonrpc_code::METHOD_NOT_FOUND, format!("unknown tool: {name}"));
    }

    let result = dispatch_tool(state, user_id, name, &arguments).await;

    match result {
        Ok(value) => ok(
            req.id,
            json!({ "content": [{ "type": "text", "text": value.to_string() }] }),
        ),
        Err(e) => err(req.id, e.jsonrpc_code(), e.public_message()),
    }
}

async fn dispatch_tool<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    name: &str,
    arguments: &Value,
) -> Result<Value, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    match name {
        "store_memory" => {
            let args = parse_store_args(arguments)?;
            let memory = ops::store_memory(state, user_id, args).await?;
            Ok(serde_json::to_value(memory).expect("Memory always serializes"))
        }
        "store_memories_bulk" => {
            let items = arguments
                .get("memories")
                .and_then(Value::as_array)
                .ok_or_else(|| ApiError::Validation { field: "memories".to_string(), reason: "must be an array".to_string() })?
                .iter()
                .map(parse_store_args)
                .collect::<Result<Vec<_>, _>>()?;
            let stored = ops::store_memories_bulk(state, user_id, items).await?;
            Ok(serde_json::to_value(stored).expect("memories always serialize"))
        }
        "search_memories" => {
            let args = parse_search_args(arguments)?;
            let outcome = ops::search_memories(state, user_id, args).await?;
            Ok(serde_json::to_value(outcome.results).expect("memories always serialize"))
        }
        "update_memory" => {
            let id = parse_uuid(arguments, "id")?;
            let args = parse_update_args(arguments)?;
            let memory = ops::update_memory(state, user_id, id, args).await?;
            Ok(serde_json::to_value(memory).expect("Memory always serializes"))
        }
        "delete_memory" => {
            let id = parse_uuid(arguments, "id")?;
            ops::delete_memory(state, user_id, id).await?;
            Ok(json!({ "deleted": true, "id": id.to_string() }))
        }
        other => Err(ApiError::Validation { field: "name".to_string(), reason: format!("unknown tool: {other}") }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use memory_activity::InMemoryActivityRepository;
    use memory_core::{InMemoryMemoryRepository, MemoryCoreConfig};
    use memory_embeddings::MockEmbeddingProvider;
    use memory_search::HybridSearch;

    use super::*;
    use crate::auth::LocalAuthenticator;
    use crate::state::AlwaysHealthy;

    fn test_state() -> AppState<InMemoryMemoryRepository, InMemoryActivityRepository> {
        let memories = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = memory_core::MemoryCore::new(memories.clone(), embeddings.clone(), None, MemoryCoreConfig::default());
        let search = HybridSearch::new(memories.clone(), Some(embeddings), None);
        let activity_repo = Arc::new(InMemoryActivityRepository::new());
        let activity =
            memory_activity::ActivityLedger::new(activity_repo, memories, chrono::FixedOffset::east_opt(0).unwrap());

        AppState {
            core,
            search,
            activity,
            authenticator: Arc::new(LocalAuthenticator),
            health: Arc::new(AlwaysHealthy),
            config: crate::config::AppConfig::load(None).unwrap(),
            started_at: chrono::Utc::now(),
        }
    }

    fn req(method: &str, params: Value) -> Request {
        Request { id: json!(1), method: method.to_string(), params }
    }

    #[tokio::test]
    async fn initialize_reports_capabilities() {
        let state = test_state();
        let resp = handle(&state, 1, req("initialize", Value::Null)).await;
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn tools_list_enumerates_five_tools() {
        let state = test_state();
        let resp = handle(&state, 1, req("tools/list", Value::Null)).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 5);
    }

    #[tokio::test]
    async fn tools_call_store_memory_round_trips() {
        let state = test_state();
        let params = json!({ "name": "store_memory", "arguments": { "content": "remember this" } });
        let resp = handle(&state, 1, req("tools/call", params)).await;
        assert!(resp.error.is_none(), "{:?}", resp.error);
        let text = resp.result.unwrap()["content"][0]["text"].as_str().unwrap().to_string();
        assert!(text.contains("remember this"));
    }

    #[tokio::test]
    async fn empty_arguments_object_is_rejected() {
        let state = test_state();
        let params = json!({ "name": "store_memory", "arguments": {} });
        let resp = handle(&state, 1, req("tools/call", params)).await;
        assert_eq!(resp.error.unwrap().code, jsonrpc_code::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let state = test_state();
        let resp = handle(&state, 1, req("bogus/method", Value::Null)).await;
        assert_eq!(resp.error.unwrap().code, jsonrpc_code::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_tool_returns_method_not_found() {
        let state = test_state();
        let params = json!({ "name": "not_a_tool", "arguments": { "x": 1 } });
        let resp = handle(&state, 1, req("tools/call", params)).await;
        assert_eq!(resp.error.unwrap().code, jsonrpc_code::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn resources_read_reports_memory_count() {
        let state = test_state();
        ops::store_memory(&state, 1, StoreArgs { content: "x".into(), ..Default::default() }).await.unwrap();
        let resp = handle(&state, 1, req("resources/read", json!({ "uri": "memory://stats" }))).await;
        assert!(resp.error.is_none());
    }
}
