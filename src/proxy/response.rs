//! Responses generated by the proxy itself

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{Response, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};

use crate::common::ProxyError;

/// Body type of every response the proxy returns
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Body returned with 403 when the target is not whitelisted
pub const REJECTION_BODY: &str = "<h1>This destination is not in the proxy whitelist</h1>";

/// Wrap a complete chunk as a response body
pub fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

/// An empty response body
pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// 403 with the whitelist rejection fragment
pub fn rejected() -> Response<ProxyBody> {
    let mut response = Response::new(full(REJECTION_BODY));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response
}

/// 200 with no body, telling the client its tunnel is ready
pub fn tunnel_established() -> Response<ProxyBody> {
    Response::new(empty())
}

/// Plain-text error response carrying the error description
pub fn error_response(err: &ProxyError) -> Response<ProxyBody> {
    if let ProxyError::NotWhitelisted(_) = err {
        return rejected();
    }

    let mut response = Response::new(full(format!("{}\n", err)));
    *response.status_mut() = err.status_code();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
