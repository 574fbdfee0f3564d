//! Request dispatcher
//!
//! Routes each parsed request by method: `CONNECT` opens a tunnel, every
//! other method is forwarded as plain HTTP.

use http::{Method, Request, Response};
use hyper::body::Incoming;
use std::convert::Infallible;
use std::sync::Arc;

use super::connect::ConnectHandler;
use super::dialer::{Dialer, TcpDialer};
use super::forward::ForwardHandler;
use super::response::ProxyBody;
use crate::config::ProxyConfig;
use crate::whitelist::Whitelist;

/// Per-request entry point shared by every connection
pub struct Dispatcher {
    connect: ConnectHandler,
    forward: ForwardHandler,
}

impl Dispatcher {
    /// Build a dispatcher that dials destinations directly
    pub fn new(config: &ProxyConfig, whitelist: Arc<Whitelist>) -> Self {
        Self::with_dialer(config, whitelist, Arc::new(TcpDialer))
    }

    /// Build a dispatcher with a custom dialer for CONNECT tunnels
    pub fn with_dialer(
        config: &ProxyConfig,
        whitelist: Arc<Whitelist>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let connect = ConnectHandler::new(
            Arc::clone(&whitelist),
            dialer,
            config.connect_timeout(),
            config.buffer_size,
        );
        let forward = ForwardHandler::new(whitelist, config.connect_timeout());

        Self { connect, forward }
    }

    /// Serve one request
    ///
    /// Never fails: handler errors are already turned into responses.
    pub async fn dispatch(
        &self,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<ProxyBody>, Infallible> {
        let response = if req.method() == Method::CONNECT {
            self.connect.handle(req).await
        } else {
            self.forward.handle(req).await
        };
        Ok(response)
    }
}
