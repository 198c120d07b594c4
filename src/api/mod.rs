//! API Module
//!
//! HTTP handlers and routing for the key-value server.
//!
//! # Endpoints
//! - `POST /api/kv` - Write a key-value pair (JSON body `{"key","value"}`)
//! - `GET /api/kv?key=K` - Read a value
//! - `DELETE /api/kv?key=K` - Delete a key
//! - `GET /stats` - Request and cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
