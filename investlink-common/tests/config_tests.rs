//! Configuration resolution tests
//!
//! Tests that manipulate INVESTLINK_* environment variables are marked with
//! #[serial] so they never run concurrently.

use investlink_common::config::{ClientConfig, ConfigOverrides, ENV_BASE_URL, ENV_TIMEOUT_MS};
use investlink_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    env::remove_var(ENV_BASE_URL);
    env::remove_var(ENV_TIMEOUT_MS);
}

#[test]
#[serial]
fn test_toml_file_values_are_used() {
    clear_env();
    let file = write_config(
        r#"
        base_url = "http://toml.example:9000"
        timeout_ms = 2500
        search_limit = 3
        "#,
    );

    let config = ClientConfig::resolve(Some(file.path()), &ConfigOverrides::default()).unwrap();

    assert_eq!(config.base_url, "http://toml.example:9000");
    assert_eq!(config.timeout_ms, 2500);
    assert_eq!(config.search_limit, 3);
    assert_eq!(config.api_prefix, "/api");
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let file = write_config(r#"base_url = "http://toml.example""#);
    env::set_var(ENV_BASE_URL, "http://env.example");
    env::set_var(ENV_TIMEOUT_MS, "4000");

    let config = ClientConfig::resolve(Some(file.path()), &ConfigOverrides::default()).unwrap();
    clear_env();

    assert_eq!(config.base_url, "http://env.example");
    assert_eq!(config.timeout_ms, 4000);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let file = write_config("");
    env::set_var(ENV_BASE_URL, "http://env.example");

    let overrides = ConfigOverrides {
        base_url: Some("http://cli.example".to_string()),
        batch_size: Some(8),
        ..Default::default()
    };
    let config = ClientConfig::resolve(Some(file.path()), &overrides).unwrap();
    clear_env();

    assert_eq!(config.base_url, "http://cli.example");
    assert_eq!(config.batch_size, 8);
}

#[test]
#[serial]
fn test_invalid_env_timeout_is_config_error() {
    clear_env();
    let file = write_config("");
    env::set_var(ENV_TIMEOUT_MS, "soon");

    let result = ClientConfig::resolve(Some(file.path()), &ConfigOverrides::default());
    clear_env();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = ClientConfig::resolve(Some(&path), &ConfigOverrides::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_malformed_file_is_error() {
    clear_env();
    let file = write_config("base_url = [not toml");

    let result = ClientConfig::resolve(Some(file.path()), &ConfigOverrides::default());
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
#[serial]
fn test_override_that_breaks_validation_is_rejected() {
    clear_env();
    let file = write_config("");
    let overrides = ConfigOverrides {
        timeout_ms: Some(0),
        ..Default::default()
    };

    let result = ClientConfig::resolve(Some(file.path()), &overrides);
    assert!(matches!(result, Err(Error::Config(_))));
}
