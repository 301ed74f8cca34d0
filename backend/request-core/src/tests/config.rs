use crate::config::{AppConfig, BASE_URL_VAR, ClientConfig, ENVIRONMENT_VAR};
use crate::error::ConfigError;

use std::collections::HashMap;
use std::io::Write;

use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
#[serial]
fn given_missing_file_when_loaded_then_defaults_returned() {
    // GIVEN: A path that does not exist
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("gamepath.toml");

    // WHEN: Loading
    let config = AppConfig::load(&path).expect("defaults on missing file");

    // THEN: Documented defaults
    assert_eq!(config.api, ClientConfig::api());
    assert_eq!(config.ml.timeout_ms, 30_000);
    assert_eq!(config.ml.retry_attempts, 2);
    assert_eq!(config.ml.retry_delay_ms, 2_000);
    assert_eq!(config.transport.proxy_prefix, "/api");
    assert!(config.environment.disallowed_domains.contains(&"gamepathai.com".to_string()));
    assert!(config.tokens.path.is_none());
}

#[test]
#[serial]
fn given_partial_file_when_loaded_then_missing_sections_defaulted() {
    // GIVEN: Only a few keys set
    let file = write_config(
        r#"
[environment]
development = true
origin_host = "app.local"

[api]
timeout_ms = 5000
"#,
    );

    // WHEN: Loading
    let config = AppConfig::load(file.path()).expect("partial config loads");

    // THEN: Set keys honored, everything else defaulted
    assert_eq!(config.api.timeout_ms, 5_000);
    assert_eq!(config.api.retry_attempts, 0);
    assert_eq!(config.ml, ClientConfig::ml());
    assert_eq!(config.environment.origin_host.as_deref(), Some("app.local"));
    assert!(config.environment.is_trusted_host("localhost"));
}

#[test]
#[serial]
fn given_malformed_toml_when_loaded_then_parse_error() {
    let file = write_config("[api\ntimeout_ms = ");

    let error = AppConfig::load(file.path()).expect_err("malformed TOML");

    assert!(matches!(error, ConfigError::ParseError { .. }));
}

/// **VALUE**: A zero timeout is rejected at load time.
///
/// **WHY THIS MATTERS**: A zero deadline would time out every request instantly and every
/// service would silently serve mock data.
///
/// **BUG THIS CATCHES**: Would catch validation being skipped after parsing.
#[test]
#[serial]
fn given_zero_timeout_when_loaded_then_validation_error() {
    // GIVEN: ML timeout set to zero
    let file = write_config("[ml]\ntimeout_ms = 0\n");

    // WHEN: Loading
    let error = AppConfig::load(file.path()).expect_err("zero timeout");

    // THEN: Validation error naming the section
    match error {
        ConfigError::ValidationError { reason, .. } => assert!(reason.contains("[ml]")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn given_invalid_base_url_when_validated_then_rejected() {
    let mut config = AppConfig::default();
    config.transport.base_url = "ftp://example.com".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn given_prefix_without_slash_when_validated_then_rejected() {
    let mut config = AppConfig::default();
    config.transport.proxy_prefix = "api".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn given_empty_trusted_host_when_validated_then_rejected() {
    let mut config = AppConfig::default();
    config.environment.trusted_hosts.push("  ".to_string());

    assert!(config.validate().is_err());
}

#[test]
fn given_env_overrides_when_applied_then_mode_and_base_url_change() {
    let mut config = AppConfig::default();

    config.apply_env_overrides(lookup(&[
        (ENVIRONMENT_VAR, "Development"),
        (BASE_URL_VAR, " http://127.0.0.1:9000 "),
    ]));

    assert!(config.environment.development);
    assert_eq!(config.transport.base_url, "http://127.0.0.1:9000");
}

#[test]
fn given_unknown_mode_when_applied_then_mode_unchanged() {
    let mut config = AppConfig::default();
    config.environment.development = true;

    config.apply_env_overrides(lookup(&[(ENVIRONMENT_VAR, "staging"), (BASE_URL_VAR, "")]));

    assert!(config.environment.development);
    assert_eq!(config.transport.base_url, "http://localhost:8000");
}

#[test]
#[serial]
fn given_process_env_when_loaded_then_overrides_file() {
    // GIVEN: File says production, environment says development
    let file = write_config("[environment]\ndevelopment = false\n");
    // SAFETY: serialized with every other test that touches the process environment
    unsafe {
        std::env::set_var(ENVIRONMENT_VAR, "dev");
    }

    // WHEN: Loading
    let result = AppConfig::load(file.path());
    unsafe {
        std::env::remove_var(ENVIRONMENT_VAR);
    }

    // THEN: Environment wins
    let config = result.expect("config loads");
    assert!(config.environment.development);
}
