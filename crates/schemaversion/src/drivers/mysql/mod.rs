//! MySQL/MariaDB driver.
//!
//! - [`MysqlDialect`]: bookkeeping SQL
//! - [`MysqlClient`]: single `mysql_async` connection
//! - [`MysqlAdapter`]: the adapter bundle
//!
//! # Connection
//!
//! One connection per adapter, built from host/port/user/password/database.
//! The `mysql_async` handshake negotiates `CLIENT_MULTI_STATEMENTS`, which
//! the two-statement table creation script relies on.

mod adapter;
mod client;
mod dialect;

pub use adapter::MysqlAdapter;
pub use client::MysqlClient;
pub use dialect::MysqlDialect;
