//! API Routes
//!
//! Configures the Axum router with all key-value server endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, fallback_handler, get_handler, health_handler, put_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/kv` - Write a key-value pair
/// - `GET /api/kv?key=K` - Read a value
/// - `DELETE /api/kv?key=K` - Delete a key
/// - `GET /stats` - Request and cache statistics
/// - `GET /health` - Health check endpoint
///
/// Other methods on `/api/kv` get `405 Method Not Allowed`; unknown paths
/// get a JSON `404`.
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/kv",
            post(put_handler).get(get_handler).delete(delete_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(fallback_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
