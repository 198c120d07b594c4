//! Error types for the key-value server
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dispatch::Status;
use crate::models::ErrorResponse;

// == Store Error ==
/// Failure reported by a persistent store connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The connection is broken or could not be established
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The store rejected or failed the command itself
    #[error("Store command failed: {0}")]
    Command(String),
}

impl StoreError {
    /// Returns true if the error means the connection must be re-established.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

// == Dispatch Error ==
/// Failure handing an operation to the worker pool.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The job queue is closed; the server is shutting down
    #[error("Dispatcher is shut down")]
    Closed,
}

// == Server Error ==
/// Failures while starting or running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listening socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// A worker could not acquire its store connection
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// `start()` was called while the server was not stopped
    #[error("Server is already running")]
    AlreadyRunning,

    /// The shutdown handle was triggered before the server started
    #[error("Shutdown already requested")]
    ShutdownRequested,
}

// == API Error ==
/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or empty key, malformed body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key absent from both cache and store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No route matches the request path
    #[error("Not found: {0}")]
    UnknownRoute(String),

    /// Persistent store failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Dispatcher is shutting down
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl ApiError {
    /// HTTP status for this error. Dispatch outcomes use [`Status::code`].
    pub fn status_code(&self) -> StatusCode {
        let outcome = match self {
            ApiError::InvalidRequest(_) => Status::ValidationError,
            ApiError::NotFound(_) | ApiError::UnknownRoute(_) => Status::NotFound,
            ApiError::Backend(_) => Status::BackendError,
            ApiError::Unavailable(_) => return StatusCode::SERVICE_UNAVAILABLE,
        };
        StatusCode::from_u16(outcome.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for server lifecycle operations.
pub type Result<T> = std::result::Result<T, ServerError>;
