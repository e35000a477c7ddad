//! MySQL/MariaDB bookkeeping SQL.

use crate::core::traits::{VersionQueries, CREATE_VERSION_TABLE_SQL};

/// MySQL/MariaDB dialect.
///
/// The table check is scoped to the configured database name.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect {
    database: String,
}

impl MysqlDialect {
    /// Create a dialect bound to `database`.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    /// The three bookkeeping statements.
    ///
    /// The database name is spliced into the check query as-is, without
    /// escaping or parameters. A database name containing a quote therefore
    /// changes the statement; callers must not feed untrusted names here.
    pub fn version_queries(&self) -> VersionQueries {
        VersionQueries {
            current_version: "SELECT version FROM schemaversion ORDER BY version DESC LIMIT 1"
                .to_string(),
            check_version_table: format!(
                "SELECT * FROM information_schema.tables WHERE table_schema = '{}' AND table_name = 'schemaversion';",
                self.database
            ),
            create_version_table: CREATE_VERSION_TABLE_SQL.to_string(),
        }
    }
}
