//! API Handlers
//!
//! HTTP request handlers: each one turns a request into an [`Operation`],
//! submits it to the worker pool and maps the outcome onto a response.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::Uri,
    Json,
};
use tracing::debug;

use crate::cache::{Cache, StatsCollector};
use crate::dispatch::{Dispatcher, Operation, RequestOutcome, Status};
use crate::error::{ApiError, DispatchError};
use crate::models::{GetResponse, HealthResponse, KeyQuery, PutRequest, StatsResponse, SuccessResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Submission handle for the worker pool
    pub dispatcher: Dispatcher,
    /// Request counters, shared with the workers
    pub stats: Arc<StatsCollector>,
    /// The shared cache, read here only for reporting
    pub cache: Arc<Cache>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, stats: Arc<StatsCollector>, cache: Arc<Cache>) -> Self {
        Self {
            dispatcher,
            stats,
            cache,
        }
    }

    async fn run(&self, op: Operation) -> Result<RequestOutcome, ApiError> {
        self.dispatcher.submit(op).await.map_err(|err| match err {
            DispatchError::Closed => ApiError::Unavailable(err.to_string()),
        })
    }
}

/// Raw query pairs, as extracted for reads and deletes.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Resolves the requested key. A rejected query string yields an empty key
/// so the request is still dispatched and counted.
fn requested_key(query: QueryPairs) -> String {
    match query {
        Ok(Query(pairs)) => KeyQuery::from_pairs(pairs).key(),
        Err(rejection) => {
            debug!("Rejected query string: {}", rejection);
            String::new()
        }
    }
}

/// Maps a non-Ok outcome onto the matching API error.
fn check(outcome: RequestOutcome, key: &str, context: &str) -> Result<Option<String>, ApiError> {
    match outcome.status {
        Status::Ok => Ok(outcome.value),
        Status::ValidationError => Err(ApiError::InvalidRequest(context.to_string())),
        Status::NotFound => Err(ApiError::NotFound(key.to_string())),
        Status::BackendError => Err(ApiError::Backend(format!("{} for key '{}'", context, key))),
    }
}

/// Handler for POST /api/kv
///
/// Writes through to the store, then updates the cache.
pub async fn put_handler(
    State(state): State<AppState>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    // A malformed body is still dispatched so it is counted as a request
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection);
            PutRequest::default()
        }
    };

    let key = req.key.clone();
    let context = if req.key.is_empty() || req.value.is_none() {
        "Invalid request body"
    } else {
        "Store write failed"
    };

    let outcome = state.run(req.into_operation()).await?;
    check(outcome, &key, context)?;

    Ok(Json(SuccessResponse::new()))
}

/// Handler for GET /api/kv?key=...
///
/// Serves from the cache, falling back to the store on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<GetResponse>, ApiError> {
    let key = requested_key(query);
    let context = if key.is_empty() {
        "Missing key parameter"
    } else {
        "Store read failed"
    };

    let outcome = state.run(Operation::read(key.clone())).await?;
    let value = check(outcome, &key, context)?.unwrap_or_default();

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /api/kv?key=...
pub async fn delete_handler(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<SuccessResponse>, ApiError> {
    let key = requested_key(query);
    let context = if key.is_empty() {
        "Missing key parameter"
    } else {
        "Store delete failed"
    };

    let outcome = state.run(Operation::delete(key.clone())).await?;
    check(outcome, &key, context)?;

    Ok(Json(SuccessResponse::new()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.stats.snapshot(),
        state.cache.len(),
        state.cache.capacity(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for paths no route matches.
pub async fn fallback_handler(uri: Uri) -> ApiError {
    ApiError::UnknownRoute(uri.path().to_string())
}
