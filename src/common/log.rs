//! Logging helpers

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Parameters
///
/// * `level` - Default log level
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // Tests and embedders may have installed a logger already
    let _ = env_logger::Builder::from_env(env).try_init();
}
