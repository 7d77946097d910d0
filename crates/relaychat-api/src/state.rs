//! Application state wiring the engine together.
//!
//! `AppState` pins the generic engine to the concrete infra implementations:
//! SQLite session store and Gemini provider. The provider stays a trait
//! object, so tests assemble the same state with a scripted provider via
//! [`AppState::from_parts`].

use std::sync::Arc;
use std::time::Duration;

use relaychat_core::chat::turn::{TurnConfig, TurnOrchestrator};
use relaychat_core::llm::provider::TextProvider;
use relaychat_infra::config::{load_config, resolve_data_dir};
use relaychat_infra::llm::gemini::GeminiProvider;
use relaychat_infra::sqlite::chat::SqliteSessionStore;
use relaychat_infra::sqlite::pool::DatabasePool;
use relaychat_types::config::AppConfig;

/// Orchestrator pinned to the SQLite store.
pub type ConcreteOrchestrator = TurnOrchestrator<SqliteSessionStore>;

/// Shared application state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub store: Arc<SqliteSessionStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load config,
    /// connect to the database, and wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        if config.provider.api_key.is_none() {
            tracing::warn!(
                "no provider API key configured (GEMINI_API_KEY or config.toml); \
                 chat requests will fail until one is set"
            );
        }

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("relaychat.db").display()
        );
        let pool = DatabasePool::new(&db_url).await?;
        let store = Arc::new(SqliteSessionStore::new(pool));

        let mut provider = GeminiProvider::new(config.provider.api_key.clone());
        if let Some(base_url) = &config.provider.base_url {
            provider = provider.with_base_url(base_url.clone());
        }

        Ok(Self::from_parts(store, Arc::new(provider), config))
    }

    /// Assemble state from pre-built parts. Tests use this to combine a
    /// temp-database store with a scripted provider.
    pub fn from_parts(
        store: Arc<SqliteSessionStore>,
        provider: Arc<dyn TextProvider>,
        config: AppConfig,
    ) -> Self {
        let turn_config = TurnConfig {
            model: config.provider.model.clone(),
            idle_timeout: Duration::from_secs(config.stream.idle_timeout_secs),
        };
        let orchestrator = Arc::new(TurnOrchestrator::new(store.clone(), provider, turn_config));

        Self {
            orchestrator,
            store,
            config: Arc::new(config),
        }
    }
}
