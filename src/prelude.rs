//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::connection::{
    ChainConnectionStore, Connection, ConnectionStore, EnvConnectionStore,
    InMemoryConnectionStore,
};
pub use crate::error::MongoHookError;
pub use crate::mongo::{
    CONN_TYPE, DEFAULT_CONN_ID, HOOK_NAME, MongoHook, MongoHookOptions, MongoHookOptionsBuilder,
    Projection, ReplaceManyOptions, ReplaceManyResult, create_uri, redact_uri,
};
