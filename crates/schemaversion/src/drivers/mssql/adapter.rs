//! SQL Server adapter bundle.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{MssqlClient, MssqlDialect};
use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::{DriverAdapter, EngineClient, VersionQueries};
use crate::core::value::QueryResult;
use crate::error::{AdapterError, Result};

static TEARDOWN_WARNED: AtomicBool = AtomicBool::new(false);

/// Adapter over the process-wide SQL Server pool.
pub struct MssqlAdapter {
    client: Box<dyn EngineClient>,
    queries: VersionQueries,
    connected: bool,
}

impl MssqlAdapter {
    /// Build an adapter backed by tiberius. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        Ok(Self::with_client(Box::new(MssqlClient::new(config)?)))
    }

    /// Build an adapter over a caller-supplied engine client.
    pub fn with_client(client: Box<dyn EngineClient>) -> Self {
        Self {
            client,
            queries: MssqlDialect::new().version_queries(),
            connected: false,
        }
    }
}

#[async_trait]
impl DriverAdapter for MssqlAdapter {
    fn kind(&self) -> DriverKind {
        DriverKind::Mssql
    }

    fn queries(&self) -> &VersionQueries {
        &self.queries
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    /// Connecting again while connected does not fail; the new pool simply
    /// takes over.
    async fn connect(&mut self) -> Result<()> {
        self.client.connect().await.map_err(AdapterError::Connection)?;
        self.connected = true;
        Ok(())
    }

    /// All result sets end up under `rows`; `fields` is never reported.
    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        if !self.connected {
            return Err(AdapterError::NotConnected);
        }
        debug!(sql_len = sql.len(), "mssql query");
        let raw = self.client.query(sql).await.map_err(AdapterError::Query)?;
        Ok(QueryResult {
            rows: Some(raw.rows.unwrap_or_default()),
            fields: None,
        })
    }

    /// No-op apart from the connected flag. The shared pool owns every
    /// connection and offers no per-connection release, so a teardown
    /// failure has nothing to be reported against.
    async fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        if !TEARDOWN_WARNED.swap(true, Ordering::SeqCst) {
            warn!(
                "SQL Server connections belong to the process-wide pool and are not closed \
                 by disconnect; they are reclaimed when idle or at process exit"
            );
        }
        // Kept for custom clients that do hold something to release.
        if let Err(e) = self.client.close().await {
            debug!("Ignoring SQL Server teardown error: {}", e);
        }
        Ok(())
    }
}
