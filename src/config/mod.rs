//! Configuration module
//!
//! This module handles application configuration: loading it from a YAML
//! file, environment variables and command line overrides, and validating
//! it before the proxy starts serving.

mod builder;
mod defaults;
mod types;
mod validator;

pub use self::builder::ConfigBuilder;
pub use self::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX, LOG_LEVEL_STR};
pub use self::types::{Proto, ProxyConfig};
pub use self::validator::{normalize_config, validate_config};

use log::info;

/// Log the configuration
pub fn log_config(config: &ProxyConfig) {
    // Only log in info level or below
    if !log::log_enabled!(log::Level::Info) {
        return;
    }

    info!("=== Final Configuration ===");
    info!("  Protocol: {}", config.proto);
    info!("  Listen address: {}", config.listen_addr());
    if config.proto == Proto::Https {
        info!("  Certificate: {}", config.pem_path.display());
        info!("  Private key: {}", config.key_path.display());
    }
    info!("  Log level: {}", config.log_level);
    info!("  Connect timeout: {} seconds", config.connect_timeout);
    info!("  Buffer size: {} bytes", config.buffer_size);
    info!("  Whitelist ({} patterns):", config.whitelist.len());
    for pattern in &config.whitelist {
        info!("    {}", pattern);
    }
    info!("=========================");
}
