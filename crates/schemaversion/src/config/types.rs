//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

/// Driver identifiers accepted by the factory, in the order they are listed
/// in error messages.
pub const SUPPORTED_DRIVERS: &[&str] = &["pg", "pg.js", "mssql", "mysql"];

/// The closed set of database engines an adapter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Mysql,
    /// Reached through either the `pg` or the `pg.js` identifier.
    Postgres,
    Mssql,
}

impl DriverKind {
    /// Resolve a driver identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnsupportedDriver`] listing the accepted
    /// identifiers when `driver` is unknown.
    pub fn parse(driver: &str) -> Result<Self> {
        match driver {
            "mysql" => Ok(DriverKind::Mysql),
            "pg" | "pg.js" => Ok(DriverKind::Postgres),
            "mssql" => Ok(DriverKind::Mssql),
            other => Err(AdapterError::UnsupportedDriver {
                driver: other.to_string(),
                supported: SUPPORTED_DRIVERS.join(" or "),
            }),
        }
    }

    /// Short engine name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Mysql => "mysql",
            DriverKind::Postgres => "postgres",
            DriverKind::Mssql => "mssql",
        }
    }

    /// Port used when the configuration does not name one.
    pub fn default_port(&self) -> u16 {
        match self {
            DriverKind::Mysql => 3306,
            DriverKind::Postgres => 5432,
            DriverKind::Mssql => 1433,
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection settings handed to [`create_adapter`](crate::create_adapter).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Driver identifier: `mysql`, `pg`, `pg.js` or `mssql`.
    pub driver: String,

    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database port. Falls back to the engine default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username.
    #[serde(default)]
    pub username: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Full PostgreSQL connection string, used instead of the synthesized one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// TLS mode: disable, require, verify-ca or verify-full (default: disable).
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

fn default_disable() -> String {
    "disable".to_string()
}
