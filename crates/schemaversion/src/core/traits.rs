//! Core traits of the adapter layer.
//!
//! - [`EngineClient`]: the lowest seam, wrapping one engine's client library
//! - [`DriverAdapter`]: the uniform contract consumed by an orchestrator
//!
//! An adapter owns exactly one engine client. The client speaks the engine's
//! protocol and reports what the engine returned; the adapter applies the
//! engine's normalization rules and the connected-state bookkeeping.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::DriverKind;
use crate::error::{AdapterError, EngineError, Result};

use super::value::{EngineResult, QueryResult};

/// Engine-level connection handling.
///
/// Errors are the engine library's own, wrapped but not reinterpreted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineClient: Send {
    /// Open the connection.
    async fn connect(&mut self) -> std::result::Result<(), EngineError>;

    /// Execute a SQL script, which may contain several statements.
    async fn query(&mut self, sql: &str) -> std::result::Result<EngineResult, EngineError>;

    /// Tear the connection down.
    async fn close(&mut self) -> std::result::Result<(), EngineError>;
}

/// The dialect-specific bookkeeping SQL of one engine.
///
/// The adapter never runs these on its own initiative except through
/// [`DriverAdapter::ensure_version_table`] and
/// [`DriverAdapter::current_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionQueries {
    /// Select the highest recorded version.
    pub current_version: String,
    /// Return at least one row when the `schemaversion` table exists.
    pub check_version_table: String,
    /// Create the table and seed it with version 0.
    pub create_version_table: String,
}

/// Table creation script, identical for every supported engine.
pub const CREATE_VERSION_TABLE_SQL: &str =
    "CREATE TABLE schemaversion (version INT); INSERT INTO schemaversion (version) VALUES (0);";

/// Uniform connect / query / disconnect contract over one database engine.
///
/// Operations take `&mut self`: a second operation cannot start until the
/// previous one has completed, which is the only ordering guarantee the
/// layer offers. There is no internal queue, retry, timeout or cancellation.
#[async_trait]
pub trait DriverAdapter: Send {
    /// Engine behind this adapter.
    fn kind(&self) -> DriverKind;

    /// Bookkeeping SQL for this engine.
    fn queries(&self) -> &VersionQueries;

    /// Whether `connect` has succeeded and `disconnect` has not been called.
    fn is_connected(&self) -> bool;

    /// Open the connection described by the configuration.
    async fn connect(&mut self) -> Result<()>;

    /// Execute `sql` and return the normalized result.
    async fn run_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Release the connection.
    async fn disconnect(&mut self) -> Result<()>;

    /// Create the `schemaversion` table if the check query finds nothing.
    ///
    /// Returns `true` when the table was created. The two-statement script is
    /// not wrapped in a transaction.
    async fn ensure_version_table(&mut self) -> Result<bool> {
        let check = self.queries().check_version_table.clone();
        if self.run_query(&check).await?.has_rows() {
            debug!("schemaversion table already present");
            return Ok(false);
        }

        let create = self.queries().create_version_table.clone();
        self.run_query(&create).await?;
        info!("Created schemaversion table on {}", self.kind());
        Ok(true)
    }

    /// Highest version recorded in `schemaversion`, or `None` if it is empty.
    async fn current_version(&mut self) -> Result<Option<i64>> {
        let sql = self.queries().current_version.clone();
        let result = self.run_query(&sql).await?;

        let Some(row) = result.first_row() else {
            return Ok(None);
        };

        let value = row
            .get("version")
            .or_else(|| row.get_index(0))
            .ok_or_else(|| AdapterError::InvalidVersion("no version column".into()))?;

        if value.is_null() {
            return Ok(None);
        }

        value
            .as_i64()
            .map(Some)
            .ok_or_else(|| AdapterError::InvalidVersion(format!("{:?}", value)))
    }
}
