//! Configuration layering tests. Serialized because they touch process-wide
//! environment variables.

use chat_relay::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests.
fn clear_env_vars() {
    unsafe {
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("JWT_REQUIRED");
        env::remove_var("RATE_LIMIT_ENABLED");
        env::remove_var("TIMEOUT_DISABLED");
        env::remove_var("CHAT_RELAY_SERVER__PORT");
        env::remove_var("CHAT_RELAY_SECURITY__JWT_REQUIRED");
        env::remove_var("CHAT_RELAY_SECURITY__JWT_SECRET");
        env::remove_var("CHAT_RELAY_ADMIN__SERVICE_URL");
    }
}

fn load(args: &[&str]) -> Result<AppConfig, config::ConfigError> {
    let mut full = vec!["chat-relay"];
    full.extend_from_slice(args);
    AppConfig::load_from_args(full)
}

#[test]
#[serial]
fn test_defaults() {
    clear_env_vars();

    let config = load(&[]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(config.security.jwt_required);
    assert!(config.resilience.rate_limit_enabled);
    assert_eq!(config.resilience.relay_timeout_secs, 30);
    assert!(config.admin.service_url.is_none());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_RELAY_SERVER__PORT", "9090");
        env::set_var("CHAT_RELAY_SECURITY__JWT_REQUIRED", "false");
        env::set_var(
            "CHAT_RELAY_ADMIN__SERVICE_URL",
            "http://127.0.0.1:9000/admin",
        );
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert!(!config.security.jwt_required);
    assert_eq!(
        config.admin.service_url.as_deref(),
        Some("http://127.0.0.1:9000/admin")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win_over_env() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_RELAY_SERVER__PORT", "9090");
    }

    let config = load(&["--port", "8181"]).expect("Failed to load config");
    assert_eq!(config.server.port, 8181);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("relay.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
security:
  jwt_secret: file-secret
"#,
    )
    .expect("Failed to write temp config");

    let config = load(&["--config", file_path.to_str().unwrap()])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.security.jwt_secret, "file-secret");
    // Untouched sections keep their defaults.
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_an_error() {
    clear_env_vars();

    let result = load(&["--config", "/definitely/not/here.yaml"]);
    assert!(result.is_err());
}
