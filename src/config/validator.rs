//! Configuration validator
//!
//! Anything rejected here stops the process before it starts serving.

use log::warn;
use std::path::Path;

use super::defaults;
use crate::common::{ProxyError, Result};
use crate::config::types::{Proto, ProxyConfig};
use crate::whitelist::Whitelist;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Bring recoverable settings back to usable values
///
/// An unknown log level falls back to the default so the logger never
/// receives a word it would read as a module filter.
pub fn normalize_config(config: &mut ProxyConfig) {
    let level = config.log_level.trim().to_ascii_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        config.log_level = level;
    } else {
        warn!(
            "Invalid log level: {}. Using default: {}",
            config.log_level,
            defaults::log_level()
        );
        config.log_level = defaults::log_level();
    }
}

/// Validate the configuration
pub fn validate_config(config: &ProxyConfig) -> Result<()> {
    validate_tls_settings(config)?;
    validate_general_settings(config)?;
    validate_whitelist(config)?;

    Ok(())
}

/// TLS materials must exist when the listener terminates TLS
fn validate_tls_settings(config: &ProxyConfig) -> Result<()> {
    if config.proto == Proto::Https {
        check_file_exists(&config.pem_path, "pemPath")?;
        check_file_exists(&config.key_path, "keyPath")?;
    }

    Ok(())
}

fn validate_general_settings(config: &ProxyConfig) -> Result<()> {
    if config.buffer_size == 0 {
        return Err(ProxyError::Config(
            "buffer_size must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout == 0 {
        return Err(ProxyError::Config(
            "connect_timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_whitelist(config: &ProxyConfig) -> Result<()> {
    let whitelist = Whitelist::compile(config.whitelist.as_slice())?;

    if whitelist.is_empty() {
        warn!("Whitelist is empty, every request will be rejected");
    }

    Ok(())
}

fn check_file_exists(path: &Path, field: &str) -> Result<()> {
    if !path.is_file() {
        return Err(ProxyError::Config(format!(
            "{} does not point to a file: {}",
            field,
            path.display()
        )));
    }

    Ok(())
}
