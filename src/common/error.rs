//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use http::StatusCode;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Whitelist proxy error type
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// TLS handshake error
    #[error("TLS handshake error: {0}")]
    TlsHandshake(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Whitelist pattern could not be compiled
    #[error("Invalid whitelist pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Target host is not covered by any whitelist rule
    #[error("Target not whitelisted: {0}")]
    NotWhitelisted(String),

    /// Dialing the destination failed
    #[error("dial tcp {target}: {source}")]
    UpstreamConnect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Dialing the destination did not finish within the connect timeout
    #[error("dial tcp {target}: i/o timeout after {timeout:?}")]
    UpstreamTimeout { target: String, timeout: Duration },

    /// The origin round trip failed
    #[error("{0}")]
    Upstream(String),

    /// The serving layer cannot hand over the raw connection
    #[error("Hijacking not supported")]
    UpgradeUnavailable,

    /// HTTP serving error
    #[error("HTTP error: {0}")]
    Hyper(#[from] hyper::Error),
}

impl ProxyError {
    /// HTTP status reported to the client when this error ends a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotWhitelisted(_) => StatusCode::FORBIDDEN,
            Self::UpstreamConnect { .. } | Self::UpstreamTimeout { .. } | Self::Upstream(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let proxy_err: ProxyError = io_err.into();

        match proxy_err {
            ProxyError::Io(_) => {}
            _ => panic!("Should convert to IO error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProxyError::Config("Protocol must be either http or https".to_string());
        assert!(err.to_string().contains("Protocol must be either http or https"));

        let err = ProxyError::UpstreamConnect {
            target: "example.com:443".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        };
        assert_eq!(err.to_string(), "dial tcp example.com:443: connection refused");

        let err = ProxyError::UpstreamTimeout {
            target: "example.com:443".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "dial tcp example.com:443: i/o timeout after 10s");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProxyError::NotWhitelisted("evil.com:443".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ProxyError::UpstreamTimeout { target: "a:1".into(), timeout: Duration::from_secs(10) }
                .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ProxyError::Upstream("connection reset".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ProxyError::UpgradeUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
