use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::{Config, SettingsStore};
use crate::corpus::crawl::DirectorySource;
use crate::corpus::{CorpusProvider, CorpusStore, LinkResolver, SiteLinkResolver};
use crate::llm::completion::{CompletionClient, HttpCompletionClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings: Arc<SettingsStore>,
    pub corpus: Arc<dyn CorpusProvider>,
    pub links: Arc<dyn LinkResolver>,
    pub llm: Arc<dyn CompletionClient>,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
    /// Per-process token the widget must echo back with every message
    pub widget_token: String,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

        let settings = SettingsStore::open(config.settings_path(), config.chat.clone())?;
        let corpus = CorpusStore::open(
            DirectorySource::new(config.content_dir.clone()),
            config.corpus_path(),
        )?;
        let links = SiteLinkResolver::new(config.site_url.clone());

        // Per-request timeouts come from the settings; only connecting is bounded here.
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_parts(
            config,
            settings,
            Arc::new(corpus),
            Arc::new(links),
            Arc::new(HttpCompletionClient::new(http_client)),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(
        config: Config,
        settings: SettingsStore,
        corpus: Arc<dyn CorpusProvider>,
        links: Arc<dyn LinkResolver>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        let max_concurrent_chats = config.max_concurrent_chats.max(1);
        Self {
            config,
            settings: Arc::new(settings),
            corpus,
            links,
            llm,
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent_chats)),
            widget_token: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}
