//! Proxy server module
//!
//! Accepts client connections, terminates TLS when the listener runs in
//! https mode, and serves HTTP/1.1 on each connection with upgrades enabled
//! so CONNECT requests can take the raw connection over.

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use openssl::ssl::{Ssl, SslAcceptor};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_openssl::SslStream;

use super::dialer::{Dialer, TcpDialer};
use super::dispatcher::Dispatcher;
use crate::common::{ProxyError, Result};
use crate::config::{Proto, ProxyConfig};
use crate::tls::create_tls_acceptor;
use crate::whitelist::Whitelist;

/// Proxy server structure
///
/// Holds everything a connection needs: the listen address, the TLS
/// acceptor for https mode and the shared request dispatcher.
pub struct Proxy {
    /// Listen address for the proxy server
    listen_addr: SocketAddr,
    /// Listener protocol
    proto: Proto,
    /// TLS acceptor, present only in https mode
    tls_acceptor: Option<Arc<SslAcceptor>>,
    /// Request dispatcher shared by every connection
    dispatcher: Arc<Dispatcher>,
}

impl Proxy {
    /// Create a new proxy instance
    ///
    /// Compiles the whitelist and, in https mode, loads the certificate
    /// and key.
    ///
    /// # Errors
    ///
    /// Returns an error if a whitelist pattern is malformed or the TLS
    /// material cannot be loaded.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use whitelist_proxy::{Proxy, config::ProxyConfig};
    /// # async fn run() -> whitelist_proxy::Result<()> {
    /// let mut config = ProxyConfig::default();
    /// config.whitelist = vec!["*.example.com".to_string()];
    ///
    /// let proxy = Proxy::new(Arc::new(config))?;
    /// proxy.run().await
    /// # }
    /// ```
    pub fn new(config: Arc<ProxyConfig>) -> Result<Self> {
        Self::with_dialer(config, Arc::new(TcpDialer))
    }

    /// Create a proxy whose CONNECT tunnels dial through `dialer`
    pub fn with_dialer(config: Arc<ProxyConfig>, dialer: Arc<dyn Dialer>) -> Result<Self> {
        let whitelist = Arc::new(Whitelist::compile(config.whitelist.as_slice())?);

        let tls_acceptor = match config.proto {
            Proto::Https => Some(Arc::new(create_tls_acceptor(
                &config.pem_path,
                &config.key_path,
            )?)),
            Proto::Http => None,
        };

        Ok(Self {
            listen_addr: config.listen_addr(),
            proto: config.proto,
            tls_acceptor,
            dispatcher: Arc::new(Dispatcher::with_dialer(&config, whitelist, dialer)),
        })
    }

    /// Configured listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Bind the configured address and serve until an error occurs
    ///
    /// # Errors
    ///
    /// Returns an error if it cannot bind to the listen address.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(ProxyError::Io)?;

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("{} {} proxy running", local_addr, self.proto);

        let mut tasks = JoinSet::new();

        loop {
            // Reap finished connections so the set does not grow unbounded
            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    error!("Connection task error: {}", e);
                }
            }

            match listener.accept().await {
                Ok((client_stream, client_addr)) => {
                    debug!("Accepted connection from {}", client_addr);

                    let tls_acceptor = self.tls_acceptor.clone();
                    let dispatcher = Arc::clone(&self.dispatcher);

                    tasks.spawn(async move {
                        if let Err(e) = handle_connection(client_stream, tls_acceptor, dispatcher).await {
                            debug!("Connection from {} ended: {}", client_addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    client_stream: TcpStream,
    tls_acceptor: Option<Arc<SslAcceptor>>,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    if let Err(e) = client_stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }

    match tls_acceptor {
        Some(acceptor) => {
            let ssl = Ssl::new(acceptor.context()).map_err(ProxyError::Ssl)?;
            let mut stream = SslStream::new(ssl, client_stream).map_err(ProxyError::Ssl)?;

            if let Err(e) = Pin::new(&mut stream).accept().await {
                debug!("TLS handshake failed: {}", e);
                return Err(ProxyError::TlsHandshake(e.to_string()));
            }
            debug!("TLS handshake successful");

            serve_http(stream, dispatcher).await
        }
        None => serve_http(client_stream, dispatcher).await,
    }
}

/// Serve HTTP/1.1 on one connection until the client goes away
async fn serve_http<S>(stream: S, dispatcher: Arc<Dispatcher>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.dispatch(req).await }
    });

    http1::Builder::new()
        .preserve_header_case(true)
        .serve_connection(TokioIo::new(stream), service)
        .with_upgrades()
        .await?;

    Ok(())
}
