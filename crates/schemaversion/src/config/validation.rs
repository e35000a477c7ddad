//! Configuration validation.

use super::{AdapterConfig, DriverKind};
use crate::drivers::common::SslMode;
use crate::error::{AdapterError, Result};

/// Validate the configuration.
///
/// The factory itself only checks the driver identifier; loaders call this
/// for the complete check before any connection attempt.
pub fn validate(config: &AdapterConfig) -> Result<()> {
    let kind = DriverKind::parse(&config.driver)?;

    let has_override = kind == DriverKind::Postgres && config.connection_string.is_some();

    if !has_override {
        if config.host.is_empty() {
            return Err(AdapterError::Config("host is required".into()));
        }
        if config.database.is_empty() {
            return Err(AdapterError::Config("database is required".into()));
        }
    }

    if kind != DriverKind::Postgres && config.username.is_empty() {
        return Err(AdapterError::Config(format!(
            "username is required for the {} driver",
            kind
        )));
    }

    if config.connection_string.is_some() && kind != DriverKind::Postgres {
        return Err(AdapterError::Config(format!(
            "connection_string is only supported by the pg drivers, got '{}'",
            config.driver
        )));
    }

    if let Some(0) = config.port {
        return Err(AdapterError::Config("port must be non-zero".into()));
    }

    SslMode::parse(&config.ssl_mode)?;

    Ok(())
}
