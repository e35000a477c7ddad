//! SQL Server engine client over a process-wide tiberius pool.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bb8::{ManageConnection, Pool, RunError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{info, warn};

use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::EngineClient;
use crate::core::value::{EngineResult, Field, Row, SqlValue};
use crate::drivers::common::SslMode;
use crate::drivers::not_connected;
use crate::error::{EngineError, Result};

/// Connections held by the shared pool.
const MSSQL_POOL_SIZE: u32 = 10;

/// How long a query waits for a pooled connection while all of them are checked out.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The pool every SQL Server adapter in the process talks through.
static GLOBAL_POOL: RwLock<Option<Pool<TiberiusConnectionManager>>> = RwLock::new(None);

fn current_pool() -> Option<Pool<TiberiusConnectionManager>> {
    GLOBAL_POOL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Install `pool`, returning whether an earlier pool was replaced.
fn install_pool(pool: Pool<TiberiusConnectionManager>) -> bool {
    GLOBAL_POOL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(pool)
        .is_some()
}

/// bb8 connection manager for tiberius clients.
#[derive(Debug, Clone)]
pub struct TiberiusConnectionManager {
    config: Config,
}

impl TiberiusConnectionManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;
        tcp.set_nodelay(true).ok();

        Client::connect(self.config.clone(), tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

fn pool_error(err: RunError<tiberius::error::Error>) -> EngineError {
    match err {
        RunError::User(e) => EngineError::Mssql(e),
        RunError::TimedOut => EngineError::PoolTimeout,
    }
}

/// Engine client that installs and uses the process-wide pool.
///
/// The client itself holds only settings; the connections belong to the
/// pool. See the [module docs](super) for the lifecycle.
pub struct MssqlClient {
    config: Config,
}

impl MssqlClient {
    /// Prepare the tiberius configuration. No I/O happens here.
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;

        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.port.unwrap_or(DriverKind::Mssql.default_port()));
        tds.database(&config.database);
        tds.application_name("schemaversion");
        tds.authentication(AuthMethod::sql_server(&config.username, &config.password));
        tds.encryption(ssl_mode.mssql_encryption());
        if ssl_mode.requires_tls() && !ssl_mode.verifies_certificate() {
            tds.trust_cert();
        }

        Ok(Self { config: tds })
    }
}

#[async_trait]
impl EngineClient for MssqlClient {
    async fn connect(&mut self) -> std::result::Result<(), EngineError> {
        let manager = TiberiusConnectionManager::new(self.config.clone());

        // One attempt, outside the pool, so the tiberius error reaches the
        // caller as-is and bad credentials fail here rather than on the
        // first query.
        let mut conn = manager.connect().await?;
        conn.simple_query("SELECT 1").await?.into_row().await?;
        drop(conn);

        // Connections are opened on demand and never retried; a failed
        // attempt is handed to the waiting query.
        let pool = Pool::builder()
            .max_size(MSSQL_POOL_SIZE)
            .connection_timeout(POOL_CONNECTION_TIMEOUT)
            .retry_connection(false)
            .build_unchecked(manager);

        if install_pool(pool) {
            warn!("Replaced the process-wide SQL Server pool; earlier connections are no longer tracked");
        }
        info!("Connected to SQL Server: {}", self.config.get_addr());
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> std::result::Result<EngineResult, EngineError> {
        let pool = current_pool().ok_or_else(not_connected)?;
        let mut conn = pool.get().await.map_err(pool_error)?;
        let results = conn.simple_query(sql).await?.into_results().await?;

        let mut rows = Vec::new();
        let mut fields = Vec::new();
        for set in results {
            for row in set {
                if fields.is_empty() {
                    fields = row
                        .columns()
                        .iter()
                        .map(|c| Field::new(c.name(), Some(format!("{:?}", c.column_type()))))
                        .collect();
                }
                rows.push(convert_row(row));
            }
        }

        Ok(EngineResult {
            rows: Some(rows),
            fields: Some(fields),
        })
    }

    /// The pool owns every connection, so there is nothing to release.
    async fn close(&mut self) -> std::result::Result<(), EngineError> {
        Ok(())
    }
}

fn convert_row(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names
        .into_iter()
        .zip(row.into_iter().map(convert_column))
        .collect()
}

fn convert_column(data: ColumnData<'static>) -> SqlValue {
    let value = match &data {
        ColumnData::U8(v) => v.map(|v| SqlValue::I64(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| SqlValue::I64(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| SqlValue::I64(i64::from(v))),
        ColumnData::I64(v) => v.map(SqlValue::I64),
        ColumnData::F32(v) => v.map(|v| SqlValue::F64(f64::from(v))),
        ColumnData::F64(v) => v.map(SqlValue::F64),
        ColumnData::Bit(v) => v.map(SqlValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| SqlValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(SqlValue::Uuid),
        ColumnData::Binary(v) => v.as_ref().map(|b| SqlValue::Bytes(b.to_vec())),
        ColumnData::Xml(v) => v.as_ref().map(|x| SqlValue::Text((**x).to_string())),
        ColumnData::Numeric(_) => Decimal::from_sql(&data)
            .ok()
            .flatten()
            .map(SqlValue::Decimal),
        ColumnData::Date(_) => NaiveDate::from_sql(&data).ok().flatten().map(SqlValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(&data).ok().flatten().map(SqlValue::Time),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)
            .ok()
            .flatten()
            .map(SqlValue::DateTimeOffset),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)
                .ok()
                .flatten()
                .map(SqlValue::DateTime)
        }
        #[allow(unreachable_patterns)]
        _ => None,
    };
    value.unwrap_or(SqlValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_new_does_not_connect() {
        let config = AdapterConfig {
            driver: "mssql".into(),
            host: "203.0.113.1".into(),
            username: "sa".into(),
            password: "pw".into(),
            database: "app".into(),
            ..Default::default()
        };
        let client = MssqlClient::new(&config).unwrap();
        assert_eq!(client.config.get_addr(), "203.0.113.1:1433");
    }

    fn refused_config() -> AdapterConfig {
        AdapterConfig {
            driver: "mssql".into(),
            host: "127.0.0.1".into(),
            port: Some(1),
            username: "sa".into(),
            password: "pw".into(),
            database: "app".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_refused_returns_engine_error() {
        let mut client = MssqlClient::new(&refused_config()).unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), client.connect())
            .await
            .expect("connect should fail without retrying")
            .unwrap_err();
        assert!(matches!(err, EngineError::Mssql(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_query_surfaces_pool_connect_error() {
        let config = MssqlClient::new(&refused_config()).unwrap().config;
        let manager = TiberiusConnectionManager::new(config);
        install_pool(
            Pool::builder()
                .max_size(1)
                .retry_connection(false)
                .build_unchecked(manager),
        );

        let mut client = MssqlClient::new(&refused_config()).unwrap();
        let err = tokio::time::timeout(Duration::from_secs(5), client.query("SELECT 1"))
            .await
            .expect("query should fail without retrying")
            .unwrap_err();
        assert!(matches!(err, EngineError::Mssql(_)), "got {err:?}");
    }

    #[test]
    fn test_convert_scalar_columns() {
        assert_eq!(convert_column(ColumnData::I32(Some(3))), SqlValue::I64(3));
        assert_eq!(convert_column(ColumnData::U8(Some(7))), SqlValue::I64(7));
        assert_eq!(convert_column(ColumnData::I32(None)), SqlValue::Null);
        assert_eq!(convert_column(ColumnData::Bit(Some(true))), SqlValue::Bool(true));
        assert_eq!(
            convert_column(ColumnData::String(Some(Cow::Borrowed("dbo")))),
            SqlValue::Text("dbo".into())
        );
        assert_eq!(
            convert_column(ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))),
            SqlValue::Bytes(vec![1, 2])
        );
    }

    #[test]
    fn test_convert_numeric_column() {
        let numeric = tiberius::numeric::Numeric::new_with_scale(1250, 2);
        assert_eq!(
            convert_column(ColumnData::Numeric(Some(numeric))),
            SqlValue::Decimal(Decimal::new(1250, 2))
        );
    }
}
