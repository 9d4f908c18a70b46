//! The crawled page snapshot, its persistence, and link resolution.
//!
//! A [`Corpus`] is immutable once built. [`CorpusStore`] publishes snapshots
//! as `Arc<Corpus>` and replaces them wholesale on every crawl, so a query
//! always scores either the previous complete snapshot or the new one.

pub mod crawl;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::PageRecord;
use crawl::ContentSource;

/// An immutable snapshot of crawled pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pages: Vec<PageRecord>,
    crawled_at: Option<DateTime<Utc>>,
}

impl Corpus {
    pub fn new(pages: Vec<PageRecord>) -> Self {
        Self {
            pages,
            crawled_at: None,
        }
    }

    fn crawled(pages: Vec<PageRecord>, at: DateTime<Utc>) -> Self {
        Self {
            pages,
            crawled_at: Some(at),
        }
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn crawled_at(&self) -> Option<DateTime<Utc>> {
        self.crawled_at
    }

    pub fn get(&self, id: &str) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.id == id)
    }
}

/// Access to the current corpus snapshot.
pub trait CorpusProvider: Send + Sync {
    /// The current snapshot (possibly empty).
    fn corpus(&self) -> Arc<Corpus>;

    /// Re-crawl everything and atomically publish the result.
    fn rebuild(&self) -> Result<Arc<Corpus>>;

    /// Crawl only if the corpus is still empty once it is this caller's turn,
    /// so concurrent first questions share one crawl.
    fn populate_if_empty(&self) -> Result<Arc<Corpus>>;
}

/// Corpus provider backed by a [`ContentSource`] with an on-disk snapshot.
pub struct CorpusStore {
    current: RwLock<Arc<Corpus>>,
    source: Box<dyn ContentSource>,
    persist_path: Option<PathBuf>,
    // serializes crawls so two rebuilds never race their swaps
    rebuild_lock: Mutex<()>,
}

impl CorpusStore {
    /// A store without persistence, starting from an empty corpus.
    pub fn in_memory(source: impl ContentSource + 'static) -> Self {
        Self {
            current: RwLock::new(Arc::new(Corpus::default())),
            source: Box::new(source),
            persist_path: None,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Load the persisted snapshot at `persist_path` if present.
    pub fn open(source: impl ContentSource + 'static, persist_path: PathBuf) -> Result<Self> {
        let corpus = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .with_context(|| format!("Failed to read {}", persist_path.display()))?;
            match serde_json::from_str::<Corpus>(&data) {
                Ok(corpus) => corpus,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable corpus snapshot {}: {e}",
                        persist_path.display()
                    );
                    Corpus::default()
                }
            }
        } else {
            Corpus::default()
        };

        tracing::info!("Loaded corpus snapshot with {} pages", corpus.len());

        Ok(Self {
            current: RwLock::new(Arc::new(corpus)),
            source: Box::new(source),
            persist_path: Some(persist_path),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Publish a snapshot built elsewhere.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let corpus = Arc::new(corpus);
        *self.current.write() = Arc::clone(&corpus);
        corpus
    }

    /// Crawl and publish; callers hold `rebuild_lock`.
    fn crawl_and_publish(&self) -> Result<Arc<Corpus>> {
        let pages = self.source.crawl().context("Crawl failed")?;
        let corpus = Corpus::crawled(pages, Utc::now());

        if let Err(e) = self.persist(&corpus) {
            tracing::warn!("Failed to persist corpus snapshot: {e:#}");
        }

        let published = self.replace(corpus);
        tracing::info!("Published corpus with {} pages", published.len());
        Ok(published)
    }

    /// Write the snapshot via temp file + rename so readers never see half a file.
    fn persist(&self, corpus: &Corpus) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let data = serde_json::to_string(corpus).context("Failed to serialize corpus")?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl CorpusProvider for CorpusStore {
    fn corpus(&self) -> Arc<Corpus> {
        Arc::clone(&self.current.read())
    }

    fn rebuild(&self) -> Result<Arc<Corpus>> {
        let _guard = self.rebuild_lock.lock();
        self.crawl_and_publish()
    }

    fn populate_if_empty(&self) -> Result<Arc<Corpus>> {
        let _guard = self.rebuild_lock.lock();
        let current = self.corpus();
        if !current.is_empty() {
            tracing::debug!("Corpus was filled while waiting for the crawl lock");
            return Ok(current);
        }
        self.crawl_and_publish()
    }
}

/// Turns a page id into the URL shown to visitors.
pub trait LinkResolver: Send + Sync {
    /// Public URL of the page, or `"#"` when it cannot be linked.
    fn resolve(&self, page_id: &str) -> String;
}

/// Resolves page ids against the public base URL of the site.
#[derive(Debug, Clone, Default)]
pub struct SiteLinkResolver {
    base_url: Option<String>,
}

impl SiteLinkResolver {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        Self { base_url }
    }
}

impl LinkResolver for SiteLinkResolver {
    fn resolve(&self, page_id: &str) -> String {
        let id = page_id.trim_start_matches('/');
        match &self.base_url {
            Some(base) if !id.is_empty() => format!("{base}/{id}"),
            _ => "#".to_string(),
        }
    }
}
