//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use site_chat::config::{ChatSettings, Config, SettingsStore};
use site_chat::corpus::crawl::ContentSource;
use site_chat::corpus::{CorpusStore, SiteLinkResolver};
use site_chat::llm::completion::{CompletionClient, CompletionError, CompletionRequest};
use site_chat::models::PageRecord;
use site_chat::state::AppState;

pub const SITE_URL: &str = "https://example.com";

/// Completion client that records every request and replies with a fixed result.
pub struct StubLlm {
    reply: Result<String, CompletionError>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl StubLlm {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: CompletionError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_user_message(&self) -> Option<String> {
        self.requests.lock().last().map(|r| r.user_message.clone())
    }
}

#[async_trait]
impl CompletionClient for StubLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().push(request.clone());
        self.reply.clone()
    }
}

/// Content source with fixed pages that counts how often it was crawled.
pub struct CountingSource {
    pages: Vec<PageRecord>,
    pub crawls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(pages: Vec<PageRecord>) -> (Self, Arc<AtomicUsize>) {
        let crawls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                pages,
                crawls: Arc::clone(&crawls),
            },
            crawls,
        )
    }
}

impl ContentSource for CountingSource {
    fn crawl(&self) -> anyhow::Result<Vec<PageRecord>> {
        self.crawls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.clone())
    }
}

pub fn pagespeed_pages() -> Vec<PageRecord> {
    vec![
        PageRecord::new(
            "pagespeed.html",
            "Pagespeed Guide",
            "So verbesserst du die Ladezeit deiner Website. Bilder komprimieren, Caching aktivieren.",
            None,
        ),
        PageRecord::new(
            "kontakt.html",
            "Kontakt",
            "Schreib uns eine Nachricht über das Formular.",
            None,
        ),
    ]
}

/// State over an in-memory corpus and the given LLM stub.
pub fn state_with(source: CountingSource, llm: Arc<StubLlm>) -> AppState {
    let config = Config {
        site_url: Some(SITE_URL.to_string()),
        ..Config::default()
    };
    AppState::with_parts(
        config,
        SettingsStore::in_memory(ChatSettings::default()),
        Arc::new(CorpusStore::in_memory(source)),
        Arc::new(SiteLinkResolver::new(Some(SITE_URL.to_string()))),
        llm,
    )
}

pub fn crawl_count(crawls: &AtomicUsize) -> usize {
    crawls.load(Ordering::SeqCst)
}
