//! Plain HTTP forwarding
//!
//! Non-CONNECT requests arrive in absolute form (`GET http://host/path`).
//! Whitelisted ones are sent to the origin in a single round trip and the
//! origin's status, headers and streamed body are relayed back unchanged.

use http::{Request, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use log::{info, warn};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use super::response::{error_response, ProxyBody};
use crate::common::{ProxyError, Result};
use crate::whitelist::Whitelist;

/// Round-trip transport to origin servers
pub type HttpClient = Client<HttpConnector, Incoming>;

/// Handler for every non-CONNECT request
pub struct ForwardHandler {
    whitelist: Arc<Whitelist>,
    client: HttpClient,
}

impl ForwardHandler {
    /// Create a forward handler with its own HTTP/1 client
    ///
    /// `connect_timeout` bounds connecting to an origin; the rest of the
    /// round trip is bounded only by the peers.
    pub fn new(whitelist: Arc<Whitelist>, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { whitelist, client }
    }

    /// Handle one forwarded request
    pub async fn handle(&self, req: Request<Incoming>) -> Response<ProxyBody> {
        match self.round_trip(req).await {
            Ok(response) => response,
            Err(e) => {
                if let ProxyError::NotWhitelisted(uri) = &e {
                    info!("Rejected request to {}: not whitelisted", uri);
                    metrics::counter!("proxy.requests.rejected").increment(1);
                } else {
                    warn!("Forwarding failed: {}", e);
                    metrics::counter!("proxy.upstream.errors").increment(1);
                }
                error_response(&e)
            }
        }
    }

    async fn round_trip(&self, req: Request<Incoming>) -> Result<Response<ProxyBody>> {
        let uri = req.uri().to_string();
        info!("http proxy {}", uri);

        let host = req.uri().host().unwrap_or_default();
        if !self.whitelist.is_allowed(host) {
            return Err(ProxyError::NotWhitelisted(uri));
        }
        metrics::counter!("proxy.requests.allowed").increment(1);

        let origin = self
            .client
            .request(req)
            .await
            .map_err(|e| ProxyError::Upstream(describe(&e)))?;

        Ok(copy_response(origin))
    }
}

/// Rebuild the origin response, keeping every header value in order
fn copy_response(origin: Response<Incoming>) -> Response<ProxyBody> {
    let (parts, body) = origin.into_parts();

    let mut response = Response::new(body.boxed());
    *response.status_mut() = parts.status;

    let headers = response.headers_mut();
    for (name, value) in parts.headers.iter() {
        headers.append(name.clone(), value.clone());
    }

    response
}

/// Flatten an error and its sources into one line
fn describe(err: &dyn StdError) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
