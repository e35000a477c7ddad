//! MySQL adapter bundle.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{MysqlClient, MysqlDialect};
use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::{DriverAdapter, EngineClient, VersionQueries};
use crate::core::value::{EngineResult, QueryResult};
use crate::error::{AdapterError, Result};

/// Adapter over one MySQL connection.
pub struct MysqlAdapter {
    client: Box<dyn EngineClient>,
    queries: VersionQueries,
    connected: bool,
}

impl MysqlAdapter {
    /// Build an adapter backed by `mysql_async`. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        Ok(Self::with_client(config, Box::new(MysqlClient::new(config)?)))
    }

    /// Build an adapter over a caller-supplied engine client.
    pub fn with_client(config: &AdapterConfig, client: Box<dyn EngineClient>) -> Self {
        Self {
            client,
            queries: MysqlDialect::new(config.database.as_str()).version_queries(),
            connected: false,
        }
    }

    /// Keep only the members the driver actually filled in.
    fn normalize(raw: EngineResult) -> QueryResult {
        QueryResult {
            rows: raw.rows.filter(|rows| !rows.is_empty()),
            fields: raw.fields.filter(|fields| !fields.is_empty()),
        }
    }
}

#[async_trait]
impl DriverAdapter for MysqlAdapter {
    fn kind(&self) -> DriverKind {
        DriverKind::Mysql
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

    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        if !self.connected {
            return Err(AdapterError::NotConnected);
        }
        debug!(sql_len = sql.len(), "mysql query");
        let raw = self.client.query(sql).await.map_err(AdapterError::Query)?;
        Ok(Self::normalize(raw))
    }

    async fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.client.close().await.map_err(AdapterError::Connection)?;
        info!("Disconnected from MySQL");
        Ok(())
    }
}
