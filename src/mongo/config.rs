use mongodb::options::ClientOptions;
use serde_json::{Map, Value};

use super::hook::{DEFAULT_CONN_ID, MongoHook};
use super::uri::{options_query, with_query};
use crate::connection::ConnectionStore;
use crate::error::MongoHookError;

/// Extras key selecting DNS-seedlist addressing. Never forwarded to the driver.
pub const SRV_KEY: &str = "srv";
/// Extras key that turns on TLS and, with it, the relaxed certificate check.
pub const SSL_KEY: &str = "ssl";
pub const TLS_ALLOW_INVALID_CERTIFICATES_KEY: &str = "tlsAllowInvalidCertificates";

/// Options for building a [`MongoHook`].
#[derive(Debug, Clone)]
pub struct MongoHookOptions {
    pub conn_id: String,
    pub app_name: Option<String>,
}

impl MongoHookOptions {
    #[must_use]
    pub fn new(conn_id: impl Into<String>) -> Self {
        Self {
            conn_id: conn_id.into(),
            app_name: None,
        }
    }

    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

impl Default for MongoHookOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CONN_ID)
    }
}

/// Fluent builder for hook options.
#[derive(Debug, Clone, Default)]
pub struct MongoHookOptionsBuilder {
    opts: MongoHookOptions,
}

impl MongoHookOptionsBuilder {
    #[must_use]
    pub fn new(conn_id: impl Into<String>) -> Self {
        Self {
            opts: MongoHookOptions::new(conn_id),
        }
    }

    #[must_use]
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.opts.app_name = Some(app_name.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> MongoHookOptions {
        self.opts
    }

    /// Resolve the connection record from `store` and build the hook.
    ///
    /// # Errors
    ///
    /// Returns `MongoHookError` if the record is missing or its connection string cannot be built.
    pub async fn build<S>(self, store: &S) -> Result<MongoHook, MongoHookError>
    where
        S: ConnectionStore + ?Sized,
    {
        MongoHook::with_options(self.finish(), store).await
    }
}

/// Loose truthiness for option values that may have come through a URI as strings.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Remove `srv` from the options and report whether it was set.
pub fn take_srv(options: &mut Map<String, Value>) -> bool {
    options.remove(SRV_KEY).is_some_and(|v| is_truthy(&v))
}

/// With `ssl` on, stop requiring a certificate that matches a specific hostname.
///
/// Any `tlsAllowInvalidCertificates` value already present is overridden.
pub fn apply_ssl_shim(options: &mut Map<String, Value>) {
    if options.get(SSL_KEY).is_some_and(is_truthy) {
        options.insert(
            TLS_ALLOW_INVALID_CERTIFICATES_KEY.to_string(),
            Value::Bool(true),
        );
    }
}

/// Parse the connection string plus options into driver client options.
///
/// # Errors
///
/// Returns `MongoHookError::ParameterError` if the options cannot be rendered and
/// `MongoHookError::MongoError` if the driver rejects the resulting connection string.
pub async fn client_options(
    uri: &str,
    options: &Map<String, Value>,
    app_name: Option<&str>,
) -> Result<ClientOptions, MongoHookError> {
    let query = options_query(options)?;
    let connection_string = with_query(uri, &query);
    let mut client_options = ClientOptions::parse(&connection_string).await?;
    if let Some(app_name) = app_name {
        client_options.app_name = Some(app_name.to_string());
    }
    Ok(client_options)
}
