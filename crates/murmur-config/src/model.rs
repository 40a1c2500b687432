// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Murmur conversation client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::fmt;

use murmur_core::Layer;
use serde::{Deserialize, Serialize};

/// Top-level Murmur configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MurmurConfig {
    /// Client-side presentation and logging.
    #[serde(default)]
    pub client: ClientConfig,

    /// Backend endpoint and request policy.
    #[serde(default)]
    pub api: ApiConfig,

    /// Bearer credential settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Local conversation-list cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Escalation answer defaults.
    #[serde(default)]
    pub escalation: EscalationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum characters kept in a conversation's last-message preview.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_preview_chars() -> usize {
    120
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for non-streaming requests. Streamed replies are never timed out.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Automatic retries of idempotent reads on 429/500/503.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before each retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Bearer credential configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Session token issued by the platform. `None` means "not logged in".
    #[serde(default)]
    pub token: Option<String>,

    /// Lifetime assumed for a token issued from configuration.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// A credential expiring within this window is re-acquired before use.
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_ttl_secs: default_token_ttl_secs(),
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("refresh_skew_secs", &self.refresh_skew_secs)
            .finish()
    }
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_refresh_skew_secs() -> u64 {
    30
}

/// Conversation-list cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Directory holding the cache files.
    #[serde(default = "default_cache_dir")]
    pub dir: String,

    /// Entries older than this are treated as missing.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> String {
    dirs::cache_dir()
        .map(|p| p.join("murmur"))
        .unwrap_or_else(|| std::path::PathBuf::from(".murmur-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Defaults applied when answering escalations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationConfig {
    /// Visibility layer used when the owner does not pick one.
    #[serde(default)]
    pub default_layer: Layer,

    /// Topic attached to knowledge published from an answer.
    #[serde(default = "default_knowledge_topic")]
    pub knowledge_topic: String,

    /// Whether published answers are pinned in the agent's knowledge base.
    #[serde(default)]
    pub pin_answers: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            default_layer: Layer::default(),
            knowledge_topic: default_knowledge_topic(),
            pin_answers: false,
        }
    }
}

fn default_knowledge_topic() -> String {
    "escalation".to_string()
}
