//! REST surface under `/api/v1` . Authentication/key-issuance
//! routes are external collaborators and are not implemented here; this
//! module wires the memory/search/stats/health routes onto the same
//! [`ops`] functions the JSON-RPC surface uses.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use memory_activity::ActivityRepository;
use memory_core::{Memory, MemoryRepository, UserId};

use crate::auth::Credential;
use crate::error::ApiError;
use crate::jsonrpc;
use crate::ops::{self, SearchArgs, StoreArgs, UpdateArgs};
use crate::state::AppState;

type Shared<R, A> = Arc<AppState<R, A>>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { error: self.public_message() })).into_response()
    }
}

async fn authenticate<R, A>(state: &Shared<R, A>, headers: &HeaderMap) -> Result<UserId, ApiError>
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let credential = if let Some(key) = headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        Credential::ApiKey(key.to_string())
    } else if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        match auth.strip_prefix("Bearer ") {
            Some(token) => Credential::Bearer(token.to_string()),
            None => return Err(ApiError::Authentication("malformed Authorization header".to_string())),
        }
    } else {
        return Err(ApiError::Authentication("missing credentials".to_string()));
    };

    state.authenticator.authenticate(&credential).await
}

#[derive(Deserialize)]
struct StoreMemoryBody {
    content: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    memory_type: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    update_key: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl From<StoreMemoryBody> for StoreArgs {
    fn from(b: StoreMemoryBody) -> Self {
        StoreArgs {
            content: b.content,
            category: b.category,
            memory_type: b.memory_type,
            priority: b.priority,
            update_key: b.update_key,
            tags: b.tags,
            metadata: b.metadata,
        }
    }
}

async fn store_memory_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    Json(body): Json<StoreMemoryBody>,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    let memory = ops::store_memory(&state, user_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(memory)).into_response())
}

#[derive(Deserialize)]
struct SearchQueryParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    memory_type: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default, rename = "useSemanticSearch")]
    use_semantic_search: Option<bool>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<Memory>,
    used_semantic: bool,
}

async fn search_memories_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    Query(params): Query<SearchQueryParams>,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    let args = SearchArgs {
        query: params.query.unwrap_or_default(),
        category: params.category,
        memory_type: params.memory_type,
        limit: params.limit,
        use_semantic: params.use_semantic_search,
    };
    let outcome = ops::search_memories(&state, user_id, args).await?;
    Ok((
        StatusCode::OK,
        Json(SearchResponse { results: outcome.results, used_semantic: outcome.used_semantic }),
    )
    .into_response())
}

async fn delete_memory_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    ops::delete_memory(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
struct UpdateMemoryBody {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    memory_type: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl From<UpdateMemoryBody> for UpdateArgs {
    fn from(b: UpdateMemoryBody) -> Self {
        UpdateArgs {
            content: b.content,
            category: b.category,
            memory_type: b.memory_type,
            priority: b.priority,
            tags: b.tags,
            metadata: b.metadata,
        }
    }
}

async fn update_memory_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMemoryBody>,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    let memory = ops::update_memory(&state, user_id, id, body.into()).await?;
    Ok((StatusCode::OK, Json(memory)).into_response())
}

#[derive(Deserialize)]
struct AutoDetectBody {
    text: String,
}

async fn auto_detect_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    Json(body): Json<AutoDetectBody>,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    let stored = ops::auto_detect_store(&state, user_id, &body.text).await?;
    Ok((StatusCode::OK, Json(stored)).into_response())
}

#[derive(Serialize)]
struct MemoryStatsResponse {
    total: i64,
    search: memory_activity::SearchStats,
    growth: Vec<memory_core::GrowthPoint>,
}

async fn memory_stats_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    let total = state.core.count(user_id).await?;
    let search = state
        .activity
        .search_stats(user_id)
        .await
        .map_err(ApiError::Database)?;
    let growth = state.core.growth(user_id, 7).await?;
    Ok((StatusCode::OK, Json(MemoryStatsResponse { total, search, growth })).into_response())
}

async fn user_activity_stats_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = authenticate(&state, &headers).await?;
    // Account/API-key bookkeeping is an external collaborator; until one
    // is wired in we report zeros rather than fabricate numbers.
    let stats = state
        .activity
        .user_activity_stats(user_id, 0, 0, state.started_at, None, 10)
        .await
        .map_err(ApiError::Database)?;
    Ok((StatusCode::OK, Json(stats)).into_response())
}

async fn system_performance_handler<R, A>(
    State(state): State<Shared<R, A>>,
) -> Result<Response, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let stats = state
        .activity
        .performance_stats(state.config.database.max_connections, state.uptime_pct(), 1.0)
        .await
        .map_err(ApiError::Database)?;
    Ok((StatusCode::OK, Json(stats)).into_response())
}

/// `POST /api/v1/mcp` — JSON-RPC 2.0 framing over HTTP . The
/// dispatch itself lives in [`jsonrpc::handle`]; this is just the HTTP
/// boundary: authenticate, decode the body, write the response back with
/// a 200 regardless of whether the RPC itself carries an `error` field.
async fn mcp_handler<R, A>(
    State(state): State<Shared<R, A>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let user_id = match authenticate(&state, &headers).await {
        Ok(uid) => uid,
        Err(e) => return e.into_response(),
    };

    let req: jsonrpc::Request = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => {
            let resp = jsonrpc::Response {
                jsonrpc: "2.0",
                id: serde_json::Value::Null,
                result: None,
                error: Some(jsonrpc::RpcError {
                    code: crate::error::jsonrpc_code::PARSE_ERROR,
                    message: "invalid JSON-RPC request".to_string(),
                }),
            };
            return (StatusCode::OK, Json(resp)).into_response();
        }
    };

    let resp = jsonrpc::handle(&state, user_id, req).await;
    (StatusCode::OK, Json(resp)).into_response()
}

async fn health_handler<R, A>(State(state): State<Shared<R, A>>) -> Response
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let report = ops::health_check(&state).await;
    let status =
        if report.database.healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(report)).into_response()
}

/// Wraps every handler in this router with a latency sample recorded to
/// the activity ledger, independent of the handler's own logging.
async fn latency_middleware<R, A>(
    State(state): State<Shared<R, A>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_millis() as i64;
    state.activity.record_latency(path, method, elapsed, response.status().as_u16() as i32, None, None);
    response
}

pub fn router<R, A>(state: Shared<R, A>) -> Router
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
    .route("/api/v1/mcp", post(mcp_handler::<R, A>))
    .route("/api/v1/memories", post(store_memory_handler::<R, A>).get(search_memories_handler::<R, A>))
    .route("/api/v1/memories/auto-detect", post(auto_detect_handler::<R, A>))
    .route(
        "/api/v1/memories/:id",
        delete(delete_memory_handler::<R, A>).patch(update_memory_handler::<R, A>),
    )
    .route("/api/v1/memories/stats", get(memory_stats_handler::<R, A>))
    .route("/api/v1/users/activity-stats", get(user_activity_stats_handler::<R, A>))
    .route("/api/v1/system/performance", get(system_performance_handler::<R, A>))
    .route("/health", get(health_handler::<R, A>))
    .route_layer(axum::middleware::from_fn_with_state(state.clone(), latency_middleware::<R, A>))
    .layer(cors)
    .with_state(state)
}
