//! Database driver implementations.
//!
//! Each driver module bundles three pieces:
//!
//! - a dialect holding the engine's bookkeeping SQL
//! - an [`EngineClient`] speaking the engine's protocol
//! - an adapter implementing [`DriverAdapter`] on top of the client
//!
//! Drivers:
//!
//! - [`mysql`]: MySQL/MariaDB (`mysql`)
//! - [`postgres`]: PostgreSQL (`pg`, `pg.js`)
//! - [`mssql`]: Microsoft SQL Server (`mssql`)
//! - [`common`]: shared utilities (TLS)
//!
//! # Dispatch
//!
//! [`Adapter`] is a closed enum with one variant per engine. Trait calls on
//! it compile down to a `match` instead of vtable dispatch.
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with a dialect, a client and an
//!    adapter
//! 2. Add a [`DriverKind`] variant and its identifiers
//! 3. Add the variant to [`Adapter`] and to [`create_adapter`]

pub mod common;
pub mod mssql;
pub mod mysql;
pub mod postgres;

pub use common::{SslMode, TlsBuilder};
pub use mssql::MssqlAdapter;
pub use mysql::MysqlAdapter;
pub use postgres::PostgresAdapter;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{AdapterConfig, DriverKind};
use crate::core::traits::{DriverAdapter, EngineClient, VersionQueries};
use crate::core::value::QueryResult;
use crate::error::{EngineError, Result};

/// Error reported by an engine client asked to query before connecting.
pub(crate) fn not_connected() -> EngineError {
    EngineError::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "no open connection",
    ))
}

/// Enum-based static dispatch over the engine adapters.
pub enum Adapter {
    Mysql(MysqlAdapter),
    Postgres(PostgresAdapter),
    Mssql(MssqlAdapter),
}

impl Adapter {
    /// Build the adapter for `kind` over a caller-supplied engine client.
    ///
    /// No I/O happens here.
    pub fn with_client(
        kind: DriverKind,
        config: &AdapterConfig,
        client: Box<dyn EngineClient>,
    ) -> Self {
        match kind {
            DriverKind::Mysql => Adapter::Mysql(MysqlAdapter::with_client(config, client)),
            DriverKind::Postgres => {
                Adapter::Postgres(PostgresAdapter::with_client(config, client))
            }
            DriverKind::Mssql => Adapter::Mssql(MssqlAdapter::with_client(client)),
        }
    }
}

#[async_trait]
impl DriverAdapter for Adapter {
    fn kind(&self) -> DriverKind {
        match self {
            Adapter::Mysql(a) => a.kind(),
            Adapter::Postgres(a) => a.kind(),
            Adapter::Mssql(a) => a.kind(),
        }
    }

    fn queries(&self) -> &VersionQueries {
        match self {
            Adapter::Mysql(a) => a.queries(),
            Adapter::Postgres(a) => a.queries(),
            Adapter::Mssql(a) => a.queries(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Adapter::Mysql(a) => a.is_connected(),
            Adapter::Postgres(a) => a.is_connected(),
            Adapter::Mssql(a) => a.is_connected(),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        match self {
            Adapter::Mysql(a) => a.connect().await,
            Adapter::Postgres(a) => a.connect().await,
            Adapter::Mssql(a) => a.connect().await,
        }
    }

    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        match self {
            Adapter::Mysql(a) => a.run_query(sql).await,
            Adapter::Postgres(a) => a.run_query(sql).await,
            Adapter::Mssql(a) => a.run_query(sql).await,
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        match self {
            Adapter::Mysql(a) => a.disconnect().await,
            Adapter::Postgres(a) => a.disconnect().await,
            Adapter::Mssql(a) => a.disconnect().await,
        }
    }
}

/// Create the adapter named by `config.driver`.
///
/// Construction is synchronous and performs no I/O; nothing is opened until
/// [`DriverAdapter::connect`]. Only the driver identifier is checked here,
/// use [`AdapterConfig::validate`] for the full set of checks.
///
/// # Errors
///
/// Returns [`AdapterError::UnsupportedDriver`](crate::AdapterError::UnsupportedDriver)
/// when the identifier is not one of `mysql`, `pg`, `pg.js` or `mssql`, and
/// a configuration error when `ssl_mode` cannot be parsed.
pub fn create_adapter(config: &AdapterConfig) -> Result<Adapter> {
    let kind = config.driver_kind()?;
    debug!("Creating {} adapter for driver '{}'", kind, config.driver);

    Ok(match kind {
        DriverKind::Mysql => Adapter::Mysql(MysqlAdapter::new(config)?),
        DriverKind::Postgres => Adapter::Postgres(PostgresAdapter::new(config)?),
        DriverKind::Mssql => Adapter::Mssql(MssqlAdapter::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::{EngineResult, Row, SqlValue};
    use crate::core::MockEngineClient;
    use crate::error::AdapterError;

    fn config(driver: &str) -> AdapterConfig {
        AdapterConfig {
            driver: driver.into(),
            host: "localhost".into(),
            username: "app".into(),
            password: "secret".into(),
            database: "shop".into(),
            ..Default::default()
        }
    }

    fn rows(values: Vec<SqlValue>) -> EngineResult {
        EngineResult {
            rows: Some(
                values
                    .into_iter()
                    .map(|v| [("version", v)].into_iter().collect::<Row>())
                    .collect(),
            ),
            fields: None,
        }
    }

    #[test]
    fn test_unsupported_driver_fails_without_runtime() {
        for driver in ["sqlite", "oracle", "postgres", "MYSQL", ""] {
            let err = create_adapter(&config(driver)).err().unwrap();
            match &err {
                AdapterError::UnsupportedDriver { driver: d, .. } => assert_eq!(d, driver),
                other => panic!("unexpected error: {other}"),
            }
            let msg = err.to_string();
            for id in ["pg", "pg.js", "mssql", "mysql"] {
                assert!(msg.contains(id), "{msg} should mention {id}");
            }
        }
    }

    #[test]
    fn test_create_adapter_per_driver() {
        let cases = [
            ("mysql", DriverKind::Mysql),
            ("pg", DriverKind::Postgres),
            ("pg.js", DriverKind::Postgres),
            ("mssql", DriverKind::Mssql),
        ];
        for (driver, kind) in cases {
            let adapter = create_adapter(&config(driver)).unwrap();
            assert_eq!(adapter.kind(), kind);
            assert!(!adapter.is_connected());
        }
    }

    #[test]
    fn test_version_queries_per_driver() {
        let create =
            "CREATE TABLE schemaversion (version INT); INSERT INTO schemaversion (version) VALUES (0);";

        let mysql = create_adapter(&config("mysql")).unwrap();
        let q = mysql.queries();
        assert_eq!(
            q.current_version,
            "SELECT version FROM schemaversion ORDER BY version DESC LIMIT 1"
        );
        assert_eq!(
            q.check_version_table,
            "SELECT * FROM information_schema.tables WHERE table_schema = 'shop' AND table_name = 'schemaversion';"
        );
        assert_eq!(q.create_version_table, create);

        for driver in ["pg", "pg.js"] {
            let pg = create_adapter(&config(driver)).unwrap();
            let q = pg.queries();
            assert_eq!(
                q.current_version,
                "SELECT version FROM schemaversion ORDER BY version DESC LIMIT 1"
            );
            assert_eq!(
                q.check_version_table,
                "SELECT * FROM pg_catalog.pg_tables WHERE schemaname = CURRENT_SCHEMA AND tablename = 'schemaversion';"
            );
            assert_eq!(q.create_version_table, create);
        }

        let mssql = create_adapter(&config("mssql")).unwrap();
        let q = mssql.queries();
        assert_eq!(
            q.current_version,
            "SELECT TOP 1 version FROM schemaversion ORDER BY version DESC"
        );
        assert_eq!(
            q.check_version_table,
            "SELECT * FROM information_schema.tables WHERE table_schema = 'dbo' AND table_name = 'schemaversion'"
        );
        assert_eq!(q.create_version_table, create);
    }

    #[test]
    fn test_bad_ssl_mode_rejected_at_construction() {
        let cfg = AdapterConfig {
            ssl_mode: "sometimes".into(),
            ..config("pg")
        };
        assert!(matches!(create_adapter(&cfg), Err(AdapterError::Config(_))));
    }

    #[tokio::test]
    async fn test_lifecycle_for_every_variant() {
        for kind in [DriverKind::Mysql, DriverKind::Postgres, DriverKind::Mssql] {
            let mut mock = MockEngineClient::new();
            mock.expect_connect().times(1).returning(|| Ok(()));
            mock.expect_query()
                .withf(|sql| sql.trim() == "SELECT 1")
                .times(1)
                .returning(|_| Ok(rows(vec![SqlValue::I64(1)])));
            mock.expect_close().returning(|| Ok(()));

            let mut adapter = Adapter::with_client(kind, &config(kind.name()), Box::new(mock));
            adapter.connect().await.unwrap();
            assert!(adapter.is_connected());
            let result = adapter.run_query("SELECT 1").await.unwrap();
            assert!(result.has_rows(), "{kind} returned no rows");
            adapter.disconnect().await.unwrap();
            assert!(!adapter.is_connected());
        }
    }

    #[tokio::test]
    async fn test_ensure_version_table_creates_when_absent() {
        let mut mock = MockEngineClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_query()
            .withf(|sql| sql.starts_with("SELECT * FROM pg_catalog.pg_tables"))
            .times(1)
            .returning(|_| {
                Ok(EngineResult {
                    rows: Some(vec![]),
                    fields: Some(vec![]),
                })
            });
        mock.expect_query()
            .withf(|sql| sql.starts_with("CREATE TABLE schemaversion"))
            .times(1)
            .returning(|_| Ok(EngineResult::default()));

        let mut adapter =
            Adapter::with_client(DriverKind::Postgres, &config("pg"), Box::new(mock));
        adapter.connect().await.unwrap();
        assert!(adapter.ensure_version_table().await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_version_table_skips_when_present() {
        let mut mock = MockEngineClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_query()
            .withf(|sql| sql.contains("information_schema.tables"))
            .times(1)
            .returning(|_| {
                Ok(EngineResult {
                    rows: Some(vec![[("table_name", SqlValue::from("schemaversion"))]
                        .into_iter()
                        .collect()]),
                    fields: None,
                })
            });
        mock.expect_query()
            .withf(|sql| sql.starts_with("CREATE"))
            .never();

        let mut adapter = Adapter::with_client(DriverKind::Mysql, &config("mysql"), Box::new(mock));
        adapter.connect().await.unwrap();
        assert!(!adapter.ensure_version_table().await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_version_table_mysql_empty_check() {
        // mysql drops the empty rows member entirely; that still means absent.
        let mut mock = MockEngineClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_query()
            .withf(|sql| sql.contains("information_schema.tables"))
            .returning(|_| Ok(EngineResult::default()));
        mock.expect_query()
            .withf(|sql| sql.starts_with("CREATE"))
            .times(1)
            .returning(|_| Ok(EngineResult::default()));

        let mut adapter = Adapter::with_client(DriverKind::Mysql, &config("mysql"), Box::new(mock));
        adapter.connect().await.unwrap();
        assert!(adapter.ensure_version_table().await.unwrap());
    }

    #[tokio::test]
    async fn test_current_version_parses_text_and_integers() {
        let cases = [
            (DriverKind::Postgres, SqlValue::from("5"), Some(5)),
            (DriverKind::Mysql, SqlValue::I64(12), Some(12)),
            (DriverKind::Mssql, SqlValue::I64(0), Some(0)),
            (DriverKind::Postgres, SqlValue::Null, None),
        ];
        for (kind, value, expected) in cases {
            let mut mock = MockEngineClient::new();
            mock.expect_connect().returning(|| Ok(()));
            mock.expect_query()
                .returning(move |_| Ok(rows(vec![value.clone()])));

            let mut adapter = Adapter::with_client(kind, &config(kind.name()), Box::new(mock));
            adapter.connect().await.unwrap();
            assert_eq!(adapter.current_version().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_current_version_empty_table() {
        let mut mock = MockEngineClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_query().returning(|_| Ok(rows(vec![])));

        let mut adapter = Adapter::with_client(DriverKind::Mssql, &config("mssql"), Box::new(mock));
        adapter.connect().await.unwrap();
        assert_eq!(adapter.current_version().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_version_rejects_non_integral() {
        let mut mock = MockEngineClient::new();
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_query()
            .returning(|_| Ok(rows(vec![SqlValue::from("v2")])));

        let mut adapter = Adapter::with_client(DriverKind::Postgres, &config("pg"), Box::new(mock));
        adapter.connect().await.unwrap();
        assert!(matches!(
            adapter.current_version().await,
            Err(AdapterError::InvalidVersion(_))
        ));
    }
}
