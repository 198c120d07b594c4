//! Redis store backend.
//!
//! Keys live as fields of a single Redis hash (`kv_store` by default), so
//! the server's data stays in one namespace of a shared Redis instance.

use redis::{Client, Commands, Connection, RedisError};
use tracing::{debug, info};

use crate::backend::{ReconnectingStore, Store, StoreConnector};
use crate::cache::Lookup;
use crate::error::StoreError;

/// Hash holding every key-value pair.
pub const DEFAULT_TABLE: &str = "kv_store";

/// Connector opening one synchronous Redis connection per worker.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    client: Client,
    table: String,
}

impl RedisConnector {
    /// Parses `url` without connecting.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(classify)?;
        Ok(Self {
            client,
            table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Uses `table` as the backing hash instead of [`DEFAULT_TABLE`].
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

impl StoreConnector for RedisConnector {
    fn connect(&self) -> Result<Box<dyn Store>, StoreError> {
        let client = self.client.clone();
        let table = self.table.clone();
        let store = ReconnectingStore::connect(move || RedisSession::open(&client, &table))?;
        info!("Connected to Redis store at {}", self.describe());
        Ok(Box::new(store))
    }

    fn describe(&self) -> String {
        format!("redis {} (hash '{}')", self.client.get_connection_info().addr, self.table)
    }
}

/// A single live Redis connection. Errors are reported as-is; reconnects
/// are handled by the wrapping [`ReconnectingStore`].
pub struct RedisSession {
    conn: Connection,
    table: String,
}

impl RedisSession {
    pub fn open(client: &Client, table: &str) -> Result<Self, StoreError> {
        let conn = client.get_connection().map_err(classify)?;
        debug!("Opened Redis session");
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }
}

impl Store for RedisSession {
    fn get(&mut self, key: &str) -> Result<Lookup, StoreError> {
        let value: Option<String> = self.conn.hget(&self.table, key).map_err(classify)?;
        Ok(value.into())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .hset::<_, _, _, ()>(&self.table, key, value)
            .map_err(classify)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .hdel::<_, _, ()>(&self.table, key)
            .map_err(classify)
    }
}

/// Splits Redis errors into connection-class and command-class failures.
fn classify(err: RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}
