//! PostgreSQL adapter bundle.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{PostgresClient, PostgresDialect};
use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::{DriverAdapter, EngineClient, VersionQueries};
use crate::core::value::QueryResult;
use crate::error::{AdapterError, Result};

/// Adapter over one PostgreSQL connection.
pub struct PostgresAdapter {
    client: Box<dyn EngineClient>,
    queries: VersionQueries,
    connection_string: String,
    connected: bool,
}

impl PostgresAdapter {
    /// Build an adapter backed by `tokio-postgres`. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        Ok(Self::with_client(config, Box::new(PostgresClient::new(config)?)))
    }

    /// Build an adapter over a caller-supplied engine client.
    pub fn with_client(config: &AdapterConfig, client: Box<dyn EngineClient>) -> Self {
        Self {
            client,
            queries: PostgresDialect::new().version_queries(),
            connection_string: config.postgres_connection_string(),
            connected: false,
        }
    }

    /// The connection string this adapter connects with.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

#[async_trait]
impl DriverAdapter for PostgresAdapter {
    fn kind(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn queries(&self) -> &VersionQueries {
        &self.queries
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<()> {
        self.client.connect().await.map_err(AdapterError::Connection)?;
        self.connected = true;
        Ok(())
    }

    /// The driver's rows and fields are handed back unchanged.
    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        if !self.connected {
            return Err(AdapterError::NotConnected);
        }
        debug!(sql_len = sql.len(), "postgres query");
        let raw = self.client.query(sql).await.map_err(AdapterError::Query)?;
        Ok(QueryResult {
            rows: raw.rows,
            fields: raw.fields,
        })
    }

    /// Teardown itself is synchronous, but completion is only reported after
    /// yielding once to the scheduler, never within the calling turn.
    async fn disconnect(&mut self) -> Result<()> {
        let closed = if self.connected {
            self.connected = false;
            self.client.close().await
        } else {
            Ok(())
        };
        tokio::task::yield_now().await;
        closed.map_err(AdapterError::Connection)?;
        info!("Disconnected from PostgreSQL");
        Ok(())
    }
}
