//! Whitelist Proxy Command Line Tool
//!
//! This binary is the command-line interface for Whitelist Proxy.

use clap::Parser;
use log::{error, info};
use std::process;
use std::sync::Arc;

// Import our library
use whitelist_proxy::common::{init_logger, Result};
use whitelist_proxy::config::{
    log_config, ConfigBuilder, DEFAULT_CONFIG_FILE, ENV_PREFIX, LOG_LEVEL_STR,
};
use whitelist_proxy::{Proxy, APP_NAME, VERSION};

/// Whitelist Proxy: forward HTTP/HTTPS proxy restricted to allowed hosts
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[clap(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Listen port, overriding the configuration file
    #[clap(short, long)]
    port: Option<u16>,

    /// Log level, overriding the configuration file
    #[clap(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Layer the configuration sources
///
/// Priority: command line > environment > file > defaults
fn config_builder(args: &Args) -> ConfigBuilder {
    let mut builder = ConfigBuilder::new()
        .with_file(&args.config)
        .with_env(ENV_PREFIX);
    if let Some(port) = args.port {
        builder = builder.with_override("port", port);
    }
    if let Some(log_level) = &args.log_level {
        builder = builder.with_override("log_level", log_level);
    }
    builder
}

/// Log level to start the logger with, before the configuration is validated
///
/// Falls back to the default when the sources cannot be read; the full load
/// that follows reports that error with logging in place.
fn startup_log_level(args: &Args) -> String {
    config_builder(args)
        .without_validation()
        .build()
        .map(|config| config.log_level)
        .unwrap_or_else(|_| LOG_LEVEL_STR.to_string())
}

async fn run(args: Args) -> Result<()> {
    init_logger(&startup_log_level(&args));

    info!("Starting {} v{}", APP_NAME, VERSION);

    let config = config_builder(&args).build()?;
    log_config(&config);

    let proxy = Proxy::new(Arc::new(config))?;

    info!("Proxy service ready, press Ctrl+C to stop");

    tokio::select! {
        result = proxy.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping");
            Ok(())
        }
    }
}
