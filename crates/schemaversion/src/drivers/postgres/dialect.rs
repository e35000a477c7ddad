//! PostgreSQL bookkeeping SQL.

use crate::core::traits::{VersionQueries, CREATE_VERSION_TABLE_SQL};

/// PostgreSQL dialect.
///
/// The table check looks in the session's current schema, so the result
/// follows the connection's `search_path`.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }

    /// The three bookkeeping statements.
    pub fn version_queries(&self) -> VersionQueries {
        VersionQueries {
            current_version: "SELECT version FROM schemaversion ORDER BY version DESC LIMIT 1"
                .to_string(),
            check_version_table: "SELECT * FROM pg_catalog.pg_tables WHERE schemaname = CURRENT_SCHEMA AND tablename = 'schemaversion';"
                .to_string(),
            create_version_table: CREATE_VERSION_TABLE_SQL.to_string(),
        }
    }
}
