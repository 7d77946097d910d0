//! Configuration loader for relaychat.
//!
//! Reads `config.toml` from the data directory (`~/.relaychat/` in
//! production) and deserializes it into [`AppConfig`]. Falls back to
//! defaults when the file is missing or malformed. The provider API key can
//! come from the file or from `GEMINI_API_KEY`; either way it is read once
//! here at load time and carried in the config object -- nothing else in
//! the workspace touches the environment for credentials.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use relaychat_types::config::AppConfig;

/// Resolve the data directory: `RELAYCHAT_DATA_DIR` env var, falling back
/// to `~/.relaychat`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("RELAYCHAT_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".relaychat"),
    }
}

/// Load application configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - The `GEMINI_API_KEY` environment variable fills `provider.api_key`
///   when the file did not set one.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    };

    if config.provider.api_key.is_none() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.provider.api_key = Some(SecretString::from(key));
            }
        }
    }

    config
}
