//! Utilities shared by the engine drivers.
//!
//! - [`tls`]: one `ssl_mode` setting mapped onto each engine's TLS options

pub mod tls;

pub use tls::{SslMode, TlsBuilder};
