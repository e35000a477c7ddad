//! # schemaversion
//!
//! Schema-version tracking over MySQL, PostgreSQL and SQL Server.
//!
//! The crate hides the differences between database engines behind one
//! adapter contract:
//!
//! - **Connection lifecycle**: `connect`, `run_query`, `disconnect`
//! - **Result shape**: rows and fields normalized per engine
//! - **Bookkeeping SQL**: the dialect's queries for the `schemaversion` table
//!
//! An orchestrator picks a driver, asks [`create_adapter`] for an adapter,
//! connects, makes sure the bookkeeping table exists, reads the current
//! version and runs its migration statements through the adapter.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schemaversion::{create_adapter, AdapterConfig, DriverAdapter};
//!
//! #[tokio::main]
//! async fn main() -> schemaversion::Result<()> {
//!     let config = AdapterConfig::load("schemaversion.yaml")?;
//!     let mut adapter = create_adapter(&config)?;
//!     adapter.connect().await?;
//!     adapter.ensure_version_table().await?;
//!     println!("current version: {:?}", adapter.current_version().await?);
//!     adapter.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;

// Re-exports for convenient access
pub use crate::config::{AdapterConfig, DriverKind, SUPPORTED_DRIVERS};
pub use crate::core::{
    DriverAdapter, EngineClient, EngineResult, Field, QueryResult, Row, SqlValue, VersionQueries,
};
pub use crate::drivers::{create_adapter, Adapter, SslMode};
pub use crate::error::{AdapterError, EngineError, Result};
