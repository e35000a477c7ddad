//! Core abstractions shared by every driver.
//!
//! - [`traits`]: the [`EngineClient`] seam and the [`DriverAdapter`] contract
//! - [`value`]: engine-neutral rows, fields and query results

pub mod traits;
pub mod value;

pub use traits::{DriverAdapter, EngineClient, VersionQueries, CREATE_VERSION_TABLE_SQL};
pub use value::{EngineResult, Field, QueryResult, Row, SqlValue};

#[cfg(test)]
pub use traits::MockEngineClient;
