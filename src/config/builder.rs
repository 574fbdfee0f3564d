//! Configuration builder
//!
//! Layers configuration sources, lowest priority first:
//!
//! 1. Default values
//! 2. YAML configuration file
//! 3. Environment variables (`WHITELIST_PROXY_*`)
//! 4. Explicit overrides (command line arguments)

use config::{Config, Environment, File, FileFormat};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::common::{ProxyError, Result};
use crate::config::types::ProxyConfig;
use crate::config::validator::{normalize_config, validate_config};

/// Configuration builder
///
/// Provides a fluent API for building configuration from multiple sources.
pub struct ConfigBuilder {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
    validate: bool,
}

impl ConfigBuilder {
    /// Create a builder with no sources beyond the defaults
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: None,
            overrides: Vec::new(),
            validate: true,
        }
    }

    /// Add a YAML file source
    ///
    /// A missing file is logged and skipped; a file that exists but cannot
    /// be parsed fails the build.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        debug!("Adding file configuration source: {}", path.display());
        self.file = Some(path.to_path_buf());
        self
    }

    /// Add environment variables with the given prefix
    pub fn with_env(mut self, prefix: &str) -> Self {
        debug!("Adding environment configuration source with prefix: {}", prefix);
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Override a single key, taking precedence over every other source
    pub fn with_override(mut self, key: &str, value: impl ToString) -> Self {
        self.overrides.push((key.to_string(), value.to_string()));
        self
    }

    /// Disable validation
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ProxyConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml));
            } else {
                warn!("Configuration file not found: {}", path.display());
                warn!("Will use default values unless overridden by environment variables or command line arguments");
            }
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("whitelist"),
            );
        }

        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key.as_str(), value.as_str())
                .map_err(|e| ProxyError::Config(format!("Invalid override for {}: {}", key, e)))?;
        }

        let mut config: ProxyConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        normalize_config(&mut config);

        if self.validate {
            debug!("Validating configuration");
            validate_config(&config)?;
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Proto;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_file() {
        let file = yaml_file(
            "proto: http\nport: 9090\nwhitelist:\n  - \"*.example.com\"\n  - api.test.org\n",
        );

        let config = ConfigBuilder::new().with_file(file.path()).build().unwrap();

        assert_eq!(config.proto, Proto::Http);
        assert_eq!(config.port, 9090);
        assert_eq!(config.whitelist, vec!["*.example.com", "api.test.org"]);
        assert_eq!(config.connect_timeout, 10);
    }

    #[test]
    fn test_camel_case_tls_paths() {
        let file = yaml_file("proto: http\npemPath: a.pem\nkeyPath: a.key\n");

        let config = ConfigBuilder::new().with_file(file.path()).build().unwrap();

        assert_eq!(config.pem_path, PathBuf::from("a.pem"));
        assert_eq!(config.key_path, PathBuf::from("a.key"));
    }

    #[test]
    fn test_invalid_proto_is_fatal() {
        let file = yaml_file("proto: ftp\nport: 9090\n");

        let err = ConfigBuilder::new().with_file(file.path()).build().unwrap_err();
        assert!(err.to_string().contains("Protocol must be either http or https"));
    }

    #[test]
    fn test_bad_pattern_is_fatal() {
        let file = yaml_file("whitelist:\n  - \"bad host\"\n");

        assert!(ConfigBuilder::new().with_file(file.path()).build().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ConfigBuilder::new()
            .with_file("does-not-exist.yaml")
            .build()
            .unwrap();

        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn test_unknown_log_level_override_falls_back() {
        let config = ConfigBuilder::new()
            .with_override("log_level", "verbose")
            .build()
            .unwrap();

        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_without_validation_skips_checks() {
        let file = yaml_file("proto: https\npemPath: missing.pem\nkeyPath: missing.key\n");

        assert!(ConfigBuilder::new().with_file(file.path()).build().is_err());

        let config = ConfigBuilder::new()
            .with_file(file.path())
            .without_validation()
            .build()
            .unwrap();
        assert_eq!(config.proto, Proto::Https);
    }

    #[test]
    fn test_override_wins_over_file() {
        let file = yaml_file("port: 9090\nlog_level: warn\n");

        let config = ConfigBuilder::new()
            .with_file(file.path())
            .with_override("port", 7070)
            .build()
            .unwrap();

        assert_eq!(config.port, 7070);
        assert_eq!(config.log_level, "warn");
    }
}
