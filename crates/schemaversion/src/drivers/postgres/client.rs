//! PostgreSQL engine client using tokio-postgres.
//!
//! Queries go through the simple query protocol: it accepts several
//! statements in one string, which the table creation script needs, and
//! returns every value as text.

use async_trait::async_trait;
use tokio_postgres::{NoTls, SimpleQueryMessage, SimpleQueryRow};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{info, warn};

use crate::config::AdapterConfig;
use crate::core::traits::EngineClient;
use crate::core::value::{EngineResult, Field, Row, SqlValue};
use crate::drivers::common::{SslMode, TlsBuilder};
use crate::drivers::not_connected;
use crate::error::{EngineError, Result};

/// A single PostgreSQL connection, opened on [`connect`](EngineClient::connect).
pub struct PostgresClient {
    connection_string: String,
    tls: Option<MakeRustlsConnect>,
    client: Option<tokio_postgres::Client>,
}

impl PostgresClient {
    /// Prepare the connection string and TLS connector. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        if !ssl_mode.requires_tls() && config.connection_string.is_none() {
            warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
        }

        Ok(Self {
            connection_string: config.postgres_connection_string(),
            tls: TlsBuilder::new(ssl_mode).build()?,
            client: None,
        })
    }
}

#[async_trait]
impl EngineClient for PostgresClient {
    async fn connect(&mut self) -> std::result::Result<(), EngineError> {
        let pg_config: tokio_postgres::Config = self.connection_string.parse()?;

        // The connection object drives the socket; it ends once the client is dropped.
        let client = match &self.tls {
            Some(tls) => {
                let (client, connection) = pg_config.connect(tls.clone()).await?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection error: {}", e);
                    }
                });
                client
            }
            None => {
                let (client, connection) = pg_config.connect(NoTls).await?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!("PostgreSQL connection error: {}", e);
                    }
                });
                client
            }
        };

        info!(
            "Connected to PostgreSQL: {:?}/{}",
            pg_config.get_hosts(),
            pg_config.get_dbname().unwrap_or_default()
        );
        self.client = Some(client);
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> std::result::Result<EngineResult, EngineError> {
        let client = self.client.as_ref().ok_or_else(not_connected)?;
        let messages = client.simple_query(sql).await?;

        let mut rows = Vec::new();
        let mut fields = Vec::new();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    fields = columns
                        .iter()
                        .map(|c| Field::new(c.name(), None))
                        .collect();
                }
                SimpleQueryMessage::Row(row) => rows.push(convert_row(&row)),
                _ => {}
            }
        }

        Ok(EngineResult {
            rows: Some(rows),
            fields: Some(fields),
        })
    }

    async fn close(&mut self) -> std::result::Result<(), EngineError> {
        // Dropping the client terminates the spawned connection task.
        drop(self.client.take());
        Ok(())
    }
}

fn convert_row(row: &SimpleQueryRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| (column.name(), SqlValue::from(row.get(idx))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_does_not_connect() {
        let config = AdapterConfig {
            driver: "pg".into(),
            host: "203.0.113.1".into(),
            username: "app".into(),
            password: "pw".into(),
            database: "orders".into(),
            ..Default::default()
        };
        let client = PostgresClient::new(&config).unwrap();
        assert!(client.client.is_none());
        assert!(client.tls.is_none());
        assert_eq!(client.connection_string, "postgres://app:pw@203.0.113.1/orders");
    }

    #[test]
    fn test_new_builds_tls_connector() {
        let config = AdapterConfig {
            driver: "pg".into(),
            connection_string: Some("postgres://app@db/orders".into()),
            ssl_mode: "verify-full".into(),
            ..Default::default()
        };
        let client = PostgresClient::new(&config).unwrap();
        assert!(client.tls.is_some());
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_connection_string() {
        let config = AdapterConfig {
            driver: "pg".into(),
            connection_string: Some("postgres://host:notaport/db".into()),
            ..Default::default()
        };
        let mut client = PostgresClient::new(&config).unwrap();
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, EngineError::Postgres(_)));
    }

    #[tokio::test]
    async fn test_connect_refused_returns_engine_error() {
        let config = AdapterConfig {
            driver: "pg".into(),
            host: "127.0.0.1".into(),
            port: Some(1),
            username: "app".into(),
            password: "pw".into(),
            database: "orders".into(),
            ..Default::default()
        };
        let mut client = PostgresClient::new(&config).unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), client.connect())
            .await
            .expect("connect should fail promptly")
            .unwrap_err();
        assert!(matches!(err, EngineError::Postgres(_)), "got {err:?}");
        assert!(client.client.is_none());
    }
}
