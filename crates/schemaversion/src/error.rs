//! Error types for the adapter layer.
//!
//! Engine errors are carried unchanged inside [`EngineError`] so callers can
//! apply engine-aware retry policy themselves. This layer never retries.

use thiserror::Error;

/// Process exit code for configuration and unsupported-driver errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Process exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Process exit code for query failures.
pub const EXIT_QUERY_ERROR: u8 = 3;
/// Process exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// An error raised by one of the underlying engine client libraries.
#[derive(Error, Debug)]
pub enum EngineError {
    /// MySQL / MariaDB client error.
    #[error(transparent)]
    Mysql(#[from] mysql_async::Error),

    /// PostgreSQL client error.
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    /// SQL Server client error.
    #[error(transparent)]
    Mssql(#[from] tiberius::error::Error),

    /// The shared SQL Server pool did not hand out a connection in time.
    #[error("timed out waiting for a pooled SQL Server connection")]
    PoolTimeout,

    /// Socket-level failure before the engine handshake.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Main error type for adapter operations.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The driver identifier is not one of the statically known engines.
    #[error("db driver '{driver}' is not supported. Must either be {supported}.")]
    UnsupportedDriver { driver: String, supported: String },

    /// Network or authentication failure while connecting.
    #[error("Connection error: {0}")]
    Connection(#[source] EngineError),

    /// Engine-side failure while executing SQL.
    #[error("Query error: {0}")]
    Query(#[source] EngineError),

    /// An operation that needs a connection was called before `connect`.
    #[error("Adapter is not connected; call connect() first")]
    NotConnected,

    /// The bookkeeping table holds a value that is not an integer version.
    #[error("Invalid schema version value: {0}")]
    InvalidVersion(String),

    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterError {
    /// Create a Connection error from anything convertible to an engine error.
    pub fn connection(err: impl Into<EngineError>) -> Self {
        AdapterError::Connection(err.into())
    }

    /// Create a Query error from anything convertible to an engine error.
    pub fn query(err: impl Into<EngineError>) -> Self {
        AdapterError::Query(err.into())
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AdapterError::Connection(_) => EXIT_CONNECTION_ERROR,
            AdapterError::Query(_) | AdapterError::NotConnected | AdapterError::InvalidVersion(_) => {
                EXIT_QUERY_ERROR
            }
            AdapterError::Io(_) => EXIT_IO_ERROR,
            AdapterError::UnsupportedDriver { .. }
            | AdapterError::Config(_)
            | AdapterError::Yaml(_)
            | AdapterError::Json(_) => EXIT_CONFIG_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
