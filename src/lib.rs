//! Connection hook for MongoDB.
//!
//! A stored connection record (host, credentials, schema and a free-form options
//! map) is turned into a MongoDB connection string and, on first use, a driver
//! [`mongodb::Client`]. The hook then forwards a fixed set of CRUD and aggregation
//! calls to the driver; pooling, retries and the wire protocol stay with the driver.
//!
//! ```rust,no_run
//! use mongo_hook::prelude::*;
//! use mongodb::bson::doc;
//!
//! # async fn run() -> Result<(), MongoHookError> {
//! let store = EnvConnectionStore::new();
//! let mut hook = MongoHook::new(DEFAULT_CONN_ID, &store).await?;
//!
//! hook.insert_one("events", doc! { "kind": "started" }, None, None).await?;
//! let latest = hook
//!     .find_one("events", doc! { "kind": "started" }, None, None, None)
//!     .await?;
//! # let _ = latest;
//! hook.close().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod mongo;
pub mod prelude;

pub use connection::{
    ChainConnectionStore, Connection, ConnectionStore, EnvConnectionStore,
    InMemoryConnectionStore,
};
pub use error::MongoHookError;
pub use mongo::{
    DEFAULT_CONN_ID, MongoHook, MongoHookOptions, MongoHookOptionsBuilder, Projection,
    create_uri, redact_uri,
};
