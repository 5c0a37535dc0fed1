// MongoDB module - the hook and everything it forwards to the driver
//
// This module is split into several sub-modules:
// - uri: connection-string assembly and redaction
// - config: client option shim and hook options/builder
// - hook: client lifecycle (lazy open, close, connection test)
// - executor: CRUD and aggregation pass-through operations
// - bulk: update-command batches behind replace_many
// - projection: find projections

pub mod bulk;
pub mod config;
pub mod executor;
pub mod hook;
pub mod projection;
pub mod uri;

// Re-export the public API
pub use bulk::{ReplaceManyOptions, ReplaceManyResult, replace_statements};
pub use config::{MongoHookOptions, MongoHookOptionsBuilder, client_options};
pub use executor::replacement_filter;
pub use hook::{CONN_NAME_ATTR, CONN_TYPE, DEFAULT_CONN_ID, HOOK_NAME, MongoHook};
pub use projection::Projection;
pub use uri::{create_uri, options_query, redact_uri};
