//! CONNECT tunnel handler
//!
//! Handles `CONNECT host:port HTTP/1.1` requests by:
//! 1. Checking the request-line authority against the whitelist
//! 2. Dialing the destination within the connect timeout
//! 3. Claiming the client connection for raw byte relaying
//! 4. Returning `200` and relaying bytes both ways once hyper hands the
//!    connection over
//!
//! The proxy never terminates the tunnelled TLS session.

use http::{Request, Response};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::dialer::Dialer;
use super::relay::spawn_tunnel;
use super::response::{error_response, tunnel_established, ProxyBody};
use crate::common::{split_authority, ProxyError, Result, DEFAULT_CONNECT_PORT};
use crate::whitelist::Whitelist;

/// Handler for CONNECT requests
pub struct ConnectHandler {
    whitelist: Arc<Whitelist>,
    dialer: Arc<dyn Dialer>,
    connect_timeout: Duration,
    buffer_size: usize,
}

impl ConnectHandler {
    /// Create a CONNECT handler
    ///
    /// # Parameters
    ///
    /// * `whitelist` - Compiled destination whitelist
    /// * `dialer` - Outbound TCP capability
    /// * `connect_timeout` - Ceiling for a single dial
    /// * `buffer_size` - Relay buffer size per direction
    pub fn new(
        whitelist: Arc<Whitelist>,
        dialer: Arc<dyn Dialer>,
        connect_timeout: Duration,
        buffer_size: usize,
    ) -> Self {
        Self {
            whitelist,
            dialer,
            connect_timeout,
            buffer_size,
        }
    }

    /// Handle one CONNECT request
    ///
    /// Every failure is turned into a response; the tunnel itself runs on
    /// spawned tasks after this returns.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ProxyBody> {
        match self.open_tunnel(req).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ProxyError::NotWhitelisted(target) => {
                        info!("Rejected tunnel to {}: not whitelisted", target);
                        metrics::counter!("proxy.requests.rejected").increment(1);
                    }
                    ProxyError::UpgradeUnavailable => warn!("{}", e),
                    _ => {
                        warn!("Tunnel failed: {}", e);
                        metrics::counter!("proxy.upstream.errors").increment(1);
                    }
                }
                error_response(&e)
            }
        }
    }

    async fn open_tunnel<B>(&self, mut req: Request<B>) -> Result<Response<ProxyBody>> {
        let target = req
            .uri()
            .authority()
            .map(|authority| authority.to_string())
            .unwrap_or_default();
        info!("tunneling proxy {}", target);

        if !self.whitelist.is_allowed(&target) {
            return Err(ProxyError::NotWhitelisted(target));
        }
        metrics::counter!("proxy.requests.allowed").increment(1);

        let destination = self.dial(&target).await?;

        let on_upgrade = req
            .extensions_mut()
            .remove::<OnUpgrade>()
            .ok_or(ProxyError::UpgradeUnavailable)?;

        let buffer_size = self.buffer_size;
        tokio::spawn(async move {
            match on_upgrade.await {
                Ok(upgraded) => {
                    debug!("Tunnel to {} established", target);
                    spawn_tunnel(TokioIo::new(upgraded), destination, buffer_size);
                }
                Err(e) => warn!("Client connection for {} was not handed over: {}", target, e),
            }
        });

        Ok(tunnel_established())
    }

    /// Dial `target`, defaulting its port to 443
    async fn dial(&self, target: &str) -> Result<TcpStream> {
        let (host, port) = split_authority(target, DEFAULT_CONNECT_PORT).ok_or_else(|| {
            ProxyError::UpstreamConnect {
                target: target.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid port"),
            }
        })?;
        let authority = format!("{}:{}", host, port);

        match timeout(self.connect_timeout, self.dialer.dial(authority.clone())).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ProxyError::UpstreamConnect {
                target: authority,
                source,
            }),
            Err(_) => Err(ProxyError::UpstreamTimeout {
                target: authority,
                timeout: self.connect_timeout,
            }),
        }
    }
}
