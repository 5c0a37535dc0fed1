use std::collections::HashMap;
use std::env::VarError;
use std::sync::Arc;

use async_trait::async_trait;

use super::record::Connection;
use crate::error::MongoHookError;

/// Environment variable prefix the orchestration framework uses for connection records.
pub const DEFAULT_ENV_PREFIX: &str = "AIRFLOW_CONN_";

/// Source of stored connection records (environment, secrets backend, metadata DB, ...).
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Look up a record by id.
    ///
    /// # Errors
    /// Returns `MongoHookError::ConnectionNotFound` when the store has no record for `conn_id`.
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, MongoHookError>;
}

type VarLookup = Arc<dyn Fn(&str) -> Result<String, VarError> + Send + Sync>;

/// Reads records from `<prefix><CONN_ID>` environment variables.
///
/// The id is upper-cased before lookup. Values beginning with `{` are JSON records;
/// anything else is parsed as a connection URI.
#[derive(Clone)]
pub struct EnvConnectionStore {
    prefix: String,
    lookup: VarLookup,
}

impl EnvConnectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: Arc::new(|name: &str| std::env::var(name)),
        }
    }

    /// Resolve variables through `lookup` instead of the process environment.
    #[must_use]
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, VarError> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    #[must_use]
    pub fn var_name(&self, conn_id: &str) -> String {
        format!("{}{}", self.prefix, conn_id.to_uppercase())
    }

    /// Parse a raw environment value into a record.
    ///
    /// # Errors
    /// Returns `MongoHookError::ConfigError` or `MongoHookError::JsonError` for malformed values.
    pub fn parse_value(conn_id: &str, raw: &str) -> Result<Connection, MongoHookError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            Connection::from_json(conn_id, trimmed)
        } else {
            Connection::from_uri(conn_id, trimmed)
        }
    }
}

impl std::fmt::Debug for EnvConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConnectionStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Default for EnvConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionStore for EnvConnectionStore {
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, MongoHookError> {
        let var = self.var_name(conn_id);
        match (self.lookup)(&var) {
            Ok(raw) => {
                tracing::debug!(conn_id, var = %var, "connection resolved from environment");
                Self::parse_value(conn_id, &raw)
            }
            Err(VarError::NotPresent) => {
                Err(MongoHookError::ConnectionNotFound(conn_id.to_string()))
            }
            Err(e) => Err(MongoHookError::ConfigError(format!("{var}: {e}"))),
        }
    }
}

/// Records held in memory, keyed by connection id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectionStore {
    connections: HashMap<String, Connection>,
}

impl InMemoryConnectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record under its own `conn_id`.
    pub fn insert(&mut self, connection: Connection) -> Option<Connection> {
        self.connections
            .insert(connection.conn_id.clone(), connection)
    }

    #[must_use]
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.insert(connection);
        self
    }

    pub fn remove(&mut self, conn_id: &str) -> Option<Connection> {
        self.connections.remove(conn_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, MongoHookError> {
        self.connections
            .get(conn_id)
            .cloned()
            .ok_or_else(|| MongoHookError::ConnectionNotFound(conn_id.to_string()))
    }
}

/// Consults several stores in order and returns the first record found.
///
/// Only `ConnectionNotFound` moves on to the next store; any other error is returned
/// immediately so a broken secrets backend is not silently skipped.
#[derive(Default)]
pub struct ChainConnectionStore {
    stores: Vec<Box<dyn ConnectionStore>>,
}

impl ChainConnectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(mut self, store: impl ConnectionStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }
}

impl std::fmt::Debug for ChainConnectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnectionStore")
            .field("stores", &self.stores.len())
            .finish()
    }
}

#[async_trait]
impl ConnectionStore for ChainConnectionStore {
    async fn get_connection(&self, conn_id: &str) -> Result<Connection, MongoHookError> {
        for store in &self.stores {
            match store.get_connection(conn_id).await {
                Err(MongoHookError::ConnectionNotFound(_)) => {}
                other => return other,
            }
        }
        Err(MongoHookError::ConnectionNotFound(conn_id.to_string()))
    }
}
