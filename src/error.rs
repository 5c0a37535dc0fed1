use thiserror::Error;

use mongodb::bson;

#[derive(Debug, Error)]
pub enum MongoHookError {
    #[error(transparent)]
    MongoError(#[from] mongodb::error::Error),

    #[error(transparent)]
    BsonSerError(#[from] bson::ser::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Document has no _id to build a replacement filter from: {0}")]
    MissingId(String),

    #[error("Write error: {0}")]
    WriteError(String),
}

impl MongoHookError {
    /// True when the error came back from the driver rather than the adapter.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::MongoError(_))
    }
}
