//! Proxy service module
//!
//! This module implements the whitelist proxy itself: the listener, the
//! per-request dispatcher, CONNECT tunnelling and plain HTTP forwarding.
//!
//! Every request is checked against the whitelist before the proxy opens
//! any outbound connection.

pub mod server;
pub mod connect;
pub mod dialer;
pub mod dispatcher;
pub mod forward;
pub mod relay;
pub mod response;

pub use server::Proxy;
pub use connect::ConnectHandler;
pub use dialer::{Dialer, TcpDialer};
pub use dispatcher::Dispatcher;
pub use forward::ForwardHandler;
pub use relay::{relay, spawn_tunnel, TunnelHandle, TunnelSignal};
pub use response::ProxyBody;
