//! Configuration types
//!
//! This module contains the main configuration types used throughout the application.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::defaults;
use crate::common::ProxyError;

/// Protocol spoken on the listening socket
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Proto {
    /// Plain HTTP
    Http,
    /// HTTP over TLS, terminated by the proxy itself
    Https,
}

// Case-insensitive, with the startup error message operators expect
impl<'de> Deserialize<'de> for Proto {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Proto::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for Proto {
    fn default() -> Self {
        defaults::proto()
    }
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Proto {
    type Err = ProxyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ProxyError::Config(format!(
                "Protocol must be either http or https, got '{}'",
                s
            ))),
        }
    }
}

/// Proxy configuration
///
/// Loaded once at startup and shared read-only (behind an `Arc`) by every
/// request handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Whether the listener terminates TLS
    pub proto: Proto,

    /// Address to bind the listener to
    pub bind: IpAddr,

    /// Listen port
    pub port: u16,

    /// PEM certificate chain served when `proto` is https
    #[serde(alias = "pemPath", alias = "pempath")]
    pub pem_path: PathBuf,

    /// PEM private key matching `pem_path`
    #[serde(alias = "keyPath", alias = "keypath")]
    pub key_path: PathBuf,

    /// Ordered hostname patterns; `*` spans any run of characters
    pub whitelist: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Upper bound in seconds for dialing a CONNECT destination
    pub connect_timeout: u64,

    /// Relay buffer size in bytes, per tunnel direction
    pub buffer_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proto: defaults::proto(),
            bind: defaults::bind(),
            port: defaults::port(),
            pem_path: defaults::pem_path(),
            key_path: defaults::key_path(),
            whitelist: Vec::new(),
            log_level: defaults::log_level(),
            connect_timeout: defaults::connect_timeout(),
            buffer_size: defaults::buffer_size(),
        }
    }
}

impl ProxyConfig {
    /// Socket address the proxy listens on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Dial timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}
