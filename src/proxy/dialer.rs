//! Outbound TCP dialing for CONNECT tunnels

use futures::future::BoxFuture;
use std::io;
use tokio::net::TcpStream;

/// Raw TCP dial capability
///
/// The CONNECT handler bounds every dial with its own timeout, so
/// implementations do not need to.
#[cfg_attr(test, mockall::automock)]
pub trait Dialer: Send + Sync {
    /// Open a TCP connection to `host:port`, resolving the host if needed
    fn dial(&self, authority: String) -> BoxFuture<'static, io::Result<TcpStream>>;
}

/// Dials destinations directly with the system resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, authority: String) -> BoxFuture<'static, io::Result<TcpStream>> {
        Box::pin(async move { TcpStream::connect(authority.as_str()).await })
    }
}
