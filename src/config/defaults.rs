//! Default configuration values
//!
//! Single source of truth for defaults used by both the serde layer and
//! `ProxyConfig::default()`.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use super::types::Proto;

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "WHITELIST_PROXY";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default serving protocol
pub fn proto() -> Proto {
    Proto::Http
}

/// Default bind address (all interfaces)
pub fn bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

/// Default listen port
pub fn port() -> u16 {
    8080
}

/// Default certificate chain path
pub fn pem_path() -> PathBuf {
    PathBuf::from("certs/server.pem")
}

/// Default private key path
pub fn key_path() -> PathBuf {
    PathBuf::from("certs/server.key")
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Default CONNECT dial timeout in seconds
pub fn connect_timeout() -> u64 {
    10
}

/// Default relay buffer size (8KB)
pub fn buffer_size() -> usize {
    8192
}
