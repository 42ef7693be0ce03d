use super::data::{BackendOverride, Config};
use super::io::ConfigError;
use crate::core::retry::RetryPolicy;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    assert_eq!(config.default_backend(), "groq");
    assert!(config.syntax_enabled());
    assert_eq!(config.speech_command(), "espeak-ng");
    assert_eq!(config.retry_policy(), RetryPolicy::default());
    assert_eq!(config.typing_interval(), Duration::from_millis(5));
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        default_backend: Some("deepseek".to_string()),
        bind: Some("0.0.0.0:8080".to_string()),
        ..Default::default()
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    // Unsetting one value leaves the other in place
    let mut config = loaded;
    config.default_backend = None;
    config
        .save_to_path(&config_path)
        .expect("Failed to save unset config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load unset config");
    assert_eq!(loaded.default_backend, None);
    assert_eq!(loaded.bind_addr(), "0.0.0.0:8080");
}

#[test]
fn nested_tables_are_read() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
default_backend = "deepseek"
data_dir = "/tmp/duochat-data"
syntax = false

[retry]
max_retries = 1
delay_ms = 250

[typing]
interval_ms = 20

[speech]
command = "say"

[backends.groq]
base_url = "http://127.0.0.1:9000/v1"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config.default_backend(), "deepseek");
    assert!(!config.syntax_enabled());
    assert_eq!(
        config.retry_policy(),
        RetryPolicy {
            max_retries: 1,
            delay: Duration::from_millis(250),
        }
    );
    assert_eq!(config.typing_interval(), Duration::from_millis(20));
    assert_eq!(config.speech_command(), "say");
    assert_eq!(config.base_url_for("GROQ"), Some("http://127.0.0.1:9000/v1"));
    assert_eq!(config.base_url_for("deepseek"), None);
    assert_eq!(
        config.resolve_data_dir().unwrap(),
        PathBuf::from("/tmp/duochat-data")
    );
}

#[test]
fn partial_retry_table_keeps_other_default() {
    let config = Config {
        retry: super::data::RetryConfig {
            max_retries: Some(5),
            delay_ms: None,
        },
        ..Default::default()
    };
    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 5);
    assert_eq!(policy.delay, Duration::from_millis(1000));
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "bind = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { ref path, .. } if *path == config_path));
    assert!(err.to_string().starts_with("Could not parse "));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn overrides_round_trip_through_toml() {
    let mut config = Config::default();
    config.backends.insert(
        "deepseek".to_string(),
        BackendOverride {
            base_url: Some("http://localhost:1234".to_string()),
        },
    );
    let text = toml::to_string_pretty(&config).unwrap();
    assert!(text.contains("[backends.deepseek]"));
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.base_url_for("deepseek"), Some("http://localhost:1234"));
}
