//! Whitelist Proxy: a forward HTTP/HTTPS proxy restricted to allowed hosts
//!
//! Clients send plain HTTP requests in absolute form or open `CONNECT`
//! tunnels. The proxy checks each destination host against an ordered list
//! of wildcard patterns and refuses with `403` anything not covered, without
//! ever contacting it.
//!
//! # Main Features
//!
//! - Hostname whitelist with `*` wildcards, ports ignored
//! - Opaque CONNECT tunnels; tunnelled TLS is never terminated
//! - Plain HTTP forwarding preserving status, headers and body
//! - Optional TLS on the listening socket
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use whitelist_proxy::{Proxy, Result};
//! use whitelist_proxy::config::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigBuilder::new()
//!         .with_file("config.yaml")
//!         .with_env("WHITELIST_PROXY")
//!         .build()?;
//!
//!     let proxy = Proxy::new(Arc::new(config))?;
//!     proxy.run().await
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod proxy;
pub mod tls;
pub mod whitelist;

// Re-export commonly used structures and functions for convenience
pub use common::{ProxyError, Result};
pub use proxy::Proxy;
pub use tls::create_tls_acceptor;
pub use whitelist::Whitelist;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
