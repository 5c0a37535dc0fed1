use clap::{Parser, Subcommand, ValueEnum};
use mongo_hook::DEFAULT_CONN_ID;
use mongo_hook::connection::DEFAULT_ENV_PREFIX;
use serde::Serialize;
use tracing::Level;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and exercise MongoDB connection records")]
pub(crate) struct Args {
    /// Environment variable prefix connection records are read from
    #[arg(long, default_value = DEFAULT_ENV_PREFIX)]
    pub(crate) env_prefix: String,
    #[arg(long, value_enum, default_value = "warn")]
    pub(crate) log_level: LogLevel,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Serialize)]
pub(crate) enum Command {
    /// Print the connection string derived from a record, password redacted
    Uri {
        #[arg(default_value = DEFAULT_CONN_ID)]
        conn_id: String,
        /// Append the client options handed to the driver
        #[arg(long)]
        with_options: bool,
    },
    /// Ping the server behind a record
    Test {
        #[arg(default_value = DEFAULT_CONN_ID)]
        conn_id: String,
    },
    /// Run a find and print matches as relaxed extended JSON, one per line
    Find {
        conn_id: String,
        collection: String,
        /// Database to query instead of the record's schema
        #[arg(long)]
        db: Option<String>,
        /// Query filter as JSON
        #[arg(long, default_value = "{}")]
        filter: String,
        /// Comma-separated field names to return
        #[arg(long, value_delimiter = ',')]
        projection: Vec<String>,
        #[arg(long)]
        limit: Option<i64>,
        /// Return only the first match
        #[arg(long)]
        one: bool,
    },
}
