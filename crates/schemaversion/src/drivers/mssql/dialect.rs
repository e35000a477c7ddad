//! SQL Server bookkeeping SQL.

use crate::core::traits::{VersionQueries, CREATE_VERSION_TABLE_SQL};

/// Microsoft SQL Server dialect.
///
/// Uses `TOP 1` instead of `LIMIT`, and checks for the table in the `dbo`
/// schema regardless of the login's default schema.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    pub fn new() -> Self {
        Self
    }

    /// The three bookkeeping statements.
    pub fn version_queries(&self) -> VersionQueries {
        VersionQueries {
            current_version: "SELECT TOP 1 version FROM schemaversion ORDER BY version DESC"
                .to_string(),
            check_version_table: "SELECT * FROM information_schema.tables WHERE table_schema = 'dbo' AND table_name = 'schemaversion'"
                .to_string(),
            create_version_table: CREATE_VERSION_TABLE_SQL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_queries() {
        let queries = MssqlDialect::new().version_queries();
        assert_eq!(
            queries.current_version,
            "SELECT TOP 1 version FROM schemaversion ORDER BY version DESC"
        );
        assert_eq!(
            queries.check_version_table,
            "SELECT * FROM information_schema.tables WHERE table_schema = 'dbo' AND table_name = 'schemaversion'"
        );
        assert_eq!(
            queries.create_version_table,
            "CREATE TABLE schemaversion (version INT); INSERT INTO schemaversion (version) VALUES (0);"
        );
    }
}
