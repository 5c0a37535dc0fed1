// Connection records and the stores they are read from
//
// - record: the stored connection record and its URI/JSON forms
// - store: lookup of records by connection id

pub mod record;
pub mod store;

pub use record::{Connection, MONGO_CONN_TYPE, REDACTED, redact_options};
pub use store::{
    ChainConnectionStore, ConnectionStore, DEFAULT_ENV_PREFIX, EnvConnectionStore,
    InMemoryConnectionStore,
};
