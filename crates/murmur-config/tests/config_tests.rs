// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Murmur configuration system.

use murmur_config::diagnostic::ConfigError;
use murmur_config::model::MurmurConfig;
use murmur_config::{load_and_validate_str, load_config_from_str};
use murmur_core::Layer;

/// A file using every section deserializes into the expected values.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[client]
log_level = "debug"
preview_chars = 80

[api]
base_url = "https://murmur.example/api"
request_timeout_secs = 10
max_retries = 2
retry_delay_ms = 250

[auth]
token = "tok-123"
token_ttl_secs = 900
refresh_skew_secs = 15

[cache]
enabled = false
dir = "/tmp/murmur-cache"
ttl_secs = 60

[escalation]
default_layer = "friends"
knowledge_topic = "owner-answers"
pin_answers = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.client.log_level, "debug");
    assert_eq!(config.client.preview_chars, 80);
    assert_eq!(config.api.base_url, "https://murmur.example/api");
    assert_eq!(config.api.max_retries, 2);
    assert_eq!(config.api.retry_delay_ms, 250);
    assert_eq!(config.auth.token.as_deref(), Some("tok-123"));
    assert_eq!(config.auth.refresh_skew_secs, 15);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.dir, "/tmp/murmur-cache");
    assert_eq!(config.escalation.default_layer, Layer::Friends);
    assert_eq!(config.escalation.knowledge_topic, "owner-answers");
    assert!(config.escalation.pin_answers);
}

/// Omitted sections fall back to defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = MurmurConfig::default();
    assert_eq!(config.api.base_url, defaults.api.base_url);
    assert_eq!(config.cache.ttl_secs, 300);
    assert_eq!(config.escalation.default_layer, Layer::Public);
    assert!(config.auth.token.is_none());
}

/// A misspelled key is reported with a suggestion.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[api]
base_ulr = "https://murmur.example/api"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an UnknownKey diagnostic");
    assert_eq!(unknown.0, "base_ulr");
    assert_eq!(unknown.1.as_deref(), Some("base_url"));
}

/// An unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n").expect_err("unknown section");
    let message = err.to_string();
    assert!(
        message.contains("unknown field") || message.contains("telemetry"),
        "got: {message}"
    );
}

/// Wrong value types are reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[api]\nmax_retries = \"many\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("max_retries"))),
        "got: {errors:?}"
    );
}

/// A layer name outside public/friends/intimate is rejected.
#[test]
fn unknown_layer_is_rejected() {
    let errors = load_and_validate_str("[escalation]\ndefault_layer = \"secret\"\n").unwrap_err();
    assert!(!errors.is_empty());
}

/// Semantic validation runs after a successful parse.
#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[api]\nbase_url = \"not a url\"\n").unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("api.base_url"))
    ));
}

/// The token never shows up in Debug output.
#[test]
fn auth_token_is_redacted_in_debug() {
    let config = load_config_from_str("[auth]\ntoken = \"very-secret\"\n").unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("very-secret"));
    assert!(debug.contains("[redacted]"));
}
