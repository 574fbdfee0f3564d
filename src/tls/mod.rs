//! TLS handling module
//!
//! Server-side TLS for the https listener. Tunnelled traffic is never
//! decrypted.

mod acceptor;

pub use acceptor::create_tls_acceptor;
