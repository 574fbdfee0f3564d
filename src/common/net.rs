//! Network utility functions
//!
//! Helpers for the `host[:port]` strings that arrive as proxy targets.

/// Default port for CONNECT targets that name no port
pub const DEFAULT_CONNECT_PORT: u16 = 443;

/// Strip the port suffix from a `host[:port]` target
///
/// The port is delimited by the last colon. Bracketed IPv6 literals
/// without a port (`[::1]`) are returned unchanged.
pub fn strip_port(target: &str) -> &str {
    if target.starts_with('[') && target.ends_with(']') {
        return target;
    }

    match target.rfind(':') {
        Some(idx) => &target[..idx],
        None => target,
    }
}

/// Split an authority into host and port, defaulting the port
///
/// # Returns
///
/// `None` when the port part is present but not a valid port number.
pub fn split_authority(authority: &str, default_port: u16) -> Option<(&str, u16)> {
    let host = strip_port(authority);
    if host.len() == authority.len() {
        return Some((host, default_port));
    }

    let port = authority[host.len() + 1..].parse::<u16>().ok()?;
    Some((host, port))
}
