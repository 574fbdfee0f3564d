//! Configuration tests
//!
//! This module contains tests for the configuration system: file loading,
//! environment variables and their priority.

use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use whitelist_proxy::config::{ConfigBuilder, Proto, ProxyConfig, ENV_PREFIX};
use whitelist_proxy::{ProxyError, Whitelist};

const ENV_VARS: &[&str] = &[
    "WHITELIST_PROXY_PORT",
    "WHITELIST_PROXY_WHITELIST",
    "WHITELIST_PROXY_LOG_LEVEL",
    "WHITELIST_PROXY_PROTO",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    fs::write(&path, content).unwrap();
    path
}

/// Test default configuration
#[test]
fn test_default_config() {
    let config = ProxyConfig::default();

    assert_eq!(config.proto, Proto::Http);
    assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8080");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.connect_timeout, 10);
    assert_eq!(config.buffer_size, 8192);
    assert!(config.whitelist.is_empty());
}

/// Test a complete file in the documented format
#[test]
#[serial]
fn test_file_config() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
proto: http
port: 3128
whitelist:
  - "*.github.com"
  - "github.com"
  - "pypi.org"
"#,
    );

    let config = ConfigBuilder::new()
        .with_file(&path)
        .with_env(ENV_PREFIX)
        .build()
        .unwrap();

    assert_eq!(config.port, 3128);
    assert_eq!(config.whitelist, vec!["*.github.com", "github.com", "pypi.org"]);

    let whitelist = Whitelist::compile(config.whitelist.as_slice()).unwrap();
    assert!(whitelist.is_allowed("api.github.com:443"));
    assert!(whitelist.is_allowed("github.com"));
    assert!(!whitelist.is_allowed("gitlab.com"));
}

/// Environment variables override the file
#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port: 3128\nwhitelist:\n  - example.com\n");

    env::set_var("WHITELIST_PROXY_PORT", "9000");
    env::set_var("WHITELIST_PROXY_WHITELIST", "a.example.com,*.b.example.com");

    let result = ConfigBuilder::new()
        .with_file(&path)
        .with_env(ENV_PREFIX)
        .build();
    clear_env();

    let config = result.unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.whitelist, vec!["a.example.com", "*.b.example.com"]);
}

/// Command line overrides win over environment variables
#[test]
#[serial]
fn test_override_wins_over_env() {
    clear_env();
    env::set_var("WHITELIST_PROXY_LOG_LEVEL", "warn");

    let result = ConfigBuilder::new()
        .with_env(ENV_PREFIX)
        .with_override("log_level", "debug")
        .build();
    clear_env();

    assert_eq!(result.unwrap().log_level, "debug");
}

/// An unknown protocol stops startup
#[test]
#[serial]
fn test_invalid_proto_from_env() {
    clear_env();
    env::set_var("WHITELIST_PROXY_PROTO", "ftp");

    let result = ConfigBuilder::new().with_env(ENV_PREFIX).build();
    clear_env();

    match result {
        Err(ProxyError::Config(message)) => {
            assert!(message.contains("Protocol must be either http or https"))
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

/// https without certificate files fails validation
#[test]
#[serial]
fn test_https_requires_certificate() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "proto: https\npemPath: /nonexistent/server.pem\nkeyPath: /nonexistent/server.key\n",
    );

    let result = ConfigBuilder::new().with_file(&path).build();
    assert!(matches!(result, Err(ProxyError::Config(_))));
}
