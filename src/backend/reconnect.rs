//! Reconnect-once wrapper for connection-oriented stores.

use tracing::{info, warn};

use crate::backend::Store;
use crate::cache::Lookup;
use crate::error::StoreError;

/// Wraps a session factory and applies the reconnect rule:
///
/// - a connection-class error drops the session and makes exactly one
///   reconnect attempt, then the original error is returned
/// - if no session is open when an operation arrives, one reconnect is
///   attempted before running it
/// - the failed operation itself is never replayed
pub struct ReconnectingStore<S, F> {
    session: Option<S>,
    connect: F,
}

impl<S, F> ReconnectingStore<S, F>
where
    S: Store,
    F: FnMut() -> Result<S, StoreError> + Send,
{
    /// Opens the initial session. Fails if it cannot be established.
    pub fn connect(mut connect: F) -> Result<Self, StoreError> {
        let session = connect()?;
        Ok(Self {
            session: Some(session),
            connect,
        })
    }

    fn reconnect(&mut self) -> Result<(), StoreError> {
        self.session = None;
        let session = (self.connect)()?;
        self.session = Some(session);
        info!("Store connection re-established");
        Ok(())
    }

    fn run<T>(
        &mut self,
        op: impl FnOnce(&mut S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut reconnected = false;
        if self.session.is_none() {
            warn!("Store connection unavailable, attempting to reconnect");
            self.reconnect()?;
            reconnected = true;
        }

        let Some(session) = self.session.as_mut() else {
            return Err(StoreError::Connection("no open session".to_string()));
        };

        match op(session) {
            Err(err) if err.is_connection() => {
                self.session = None;
                if !reconnected {
                    warn!("Store connection lost ({}), attempting to reconnect", err);
                    if let Err(reconnect_err) = self.reconnect() {
                        warn!("Store reconnect failed: {}", reconnect_err);
                    }
                }
                Err(err)
            }
            result => result,
        }
    }
}

impl<S, F> Store for ReconnectingStore<S, F>
where
    S: Store,
    F: FnMut() -> Result<S, StoreError> + Send,
{
    fn get(&mut self, key: &str) -> Result<Lookup, StoreError> {
        self.run(|session| session.get(key))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.run(|session| session.put(key, value))
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.run(|session| session.delete(key))
    }
}
