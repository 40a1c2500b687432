// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: URL shape, known log levels,
//! and relationships between durations.

use crate::diagnostic::ConfigError;
use crate::model::MurmurConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration, collecting every error instead of failing fast.
pub fn validate_config(config: &MurmurConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.client.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "client.log_level `{}` must be one of: {}",
            config.client.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.client.preview_chars == 0 {
        errors.push(ConfigError::validation(
            "client.preview_chars must be greater than 0",
        ));
    }

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::validation(format!(
            "api.base_url must use http or https, got `{}`",
            url.scheme()
        ))),
        Err(e) => errors.push(ConfigError::validation(format!(
            "api.base_url `{}` is not a valid URL: {e}",
            config.api.base_url
        ))),
    }

    if config.api.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "api.request_timeout_secs must be greater than 0",
        ));
    }

    if let Some(token) = &config.auth.token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "auth.token must not be empty when set",
        ));
    }

    if config.auth.refresh_skew_secs >= config.auth.token_ttl_secs {
        errors.push(ConfigError::validation(format!(
            "auth.refresh_skew_secs ({}) must be less than auth.token_ttl_secs ({})",
            config.auth.refresh_skew_secs, config.auth.token_ttl_secs
        )));
    }

    if config.cache.enabled {
        if config.cache.ttl_secs == 0 {
            errors.push(ConfigError::validation(
                "cache.ttl_secs must be greater than 0 when the cache is enabled",
            ));
        }
        if config.cache.dir.trim().is_empty() {
            errors.push(ConfigError::validation(
                "cache.dir must not be empty when the cache is enabled",
            ));
        }
    }

    if config.escalation.knowledge_topic.trim().is_empty() {
        errors.push(ConfigError::validation(
            "escalation.knowledge_topic must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
