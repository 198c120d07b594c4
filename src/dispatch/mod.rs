//! Dispatch Module
//!
//! Cache-aside request dispatch: parsed operations go in, outcomes come out.
//!
//! # Components
//! - [`dispatch`]: the read/write/delete protocol over Cache, Store and stats
//! - [`WorkerPool`]: fixed set of worker threads, each owning a Store
//! - [`Dispatcher`]: cloneable handle feeding the pool's bounded queue

mod pool;
mod protocol;

pub use pool::{Dispatcher, WorkerPool};
pub use protocol::dispatch;

// == Operation ==
/// Kind of a parsed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Read,
    Write,
    Delete,
}

/// A parsed request handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OpKind,
    pub key: String,
    /// Required for writes, ignored otherwise
    pub value: Option<String>,
}

impl Operation {
    pub fn read(key: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Read,
            key: key.into(),
            value: None,
        }
    }

    pub fn write(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Write,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Delete,
            key: key.into(),
            value: None,
        }
    }
}

// == Request Outcome ==
/// Result status of a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    ValidationError,
    BackendError,
}

impl Status {
    /// Conventional HTTP status code for this outcome.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::ValidationError => 400,
            Status::NotFound => 404,
            Status::BackendError => 500,
        }
    }
}

/// What the dispatcher hands back to the response-building layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: Status,
    pub value: Option<String>,
}

impl RequestOutcome {
    pub fn ok() -> Self {
        Self::with_status(Status::Ok)
    }

    pub fn found(value: String) -> Self {
        Self {
            status: Status::Ok,
            value: Some(value),
        }
    }

    pub fn not_found() -> Self {
        Self::with_status(Status::NotFound)
    }

    pub fn validation_error() -> Self {
        Self::with_status(Status::ValidationError)
    }

    pub fn backend_error() -> Self {
        Self::with_status(Status::BackendError)
    }

    fn with_status(status: Status) -> Self {
        Self {
            status,
            value: None,
        }
    }
}
