//! Application configuration for relaychat.
//!
//! Deserialized from `{data_dir}/config.toml` by the infra loader; every
//! field has a default so a missing or partial file still yields a working
//! configuration. The provider API key is wrapped in [`SecretString`] and
//! never appears in Debug output or logs.

use secrecy::SecretString;
use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub stream: StreamConfig,
    pub sessions: SessionConfig,
}

/// Generative-text provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier sent with every generate request.
    pub model: String,
    /// API key. Usually supplied via the `GEMINI_API_KEY` environment
    /// variable, which the loader folds in when this field is unset.
    pub api_key: Option<SecretString>,
    /// Override the provider base URL (useful for tests and proxies).
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Streaming behavior settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Abort a provider stream that produces nothing for this long.
    pub idle_timeout_secs: u64,
    /// Capacity of the fragment channel between orchestrator and transport.
    /// A full channel suspends the relay until the client drains.
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 60,
            channel_capacity: 32,
        }
    }
}

/// Session listing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on sessions returned by the listing endpoint.
    pub list_limit: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { list_limit: 50 }
    }
}
