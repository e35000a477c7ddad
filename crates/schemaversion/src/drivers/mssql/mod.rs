//! Microsoft SQL Server driver.
//!
//! - [`MssqlDialect`]: bookkeeping SQL
//! - [`MssqlClient`]: engine client over the process-wide tiberius pool
//! - [`MssqlAdapter`]: the adapter bundle
//!
//! # Shared Pool
//!
//! SQL Server connections are not owned by an adapter. `connect` installs a
//! `bb8` pool of tiberius connections as a process-wide resource, replacing
//! any pool installed earlier, and every SQL Server adapter in the process
//! queries through whichever pool is current. There is no per-adapter
//! release: `disconnect` is a no-op and idle connections are reclaimed by
//! the pool or at process exit. Two adapters connected to different servers
//! in one process therefore end up sharing the most recent pool.

mod adapter;
mod client;
mod dialect;

pub use adapter::MssqlAdapter;
pub use client::{MssqlClient, TiberiusConnectionManager};
pub use dialect::MssqlDialect;
