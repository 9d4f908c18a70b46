use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::models::PageRecord;

/// Files larger than this are not treated as pages.
const MAX_PAGE_BYTES: u64 = 1_048_576;

static NON_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|template)\b[^>]*>.*?</(script|style|noscript|template)\s*>")
        .expect("non-content regex is valid")
});
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("markdown link regex is valid")
});
static MD_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s{0,3}(#{1,6}|>|[-*+]|\d+\.)\s+|[*_`~]{1,3}").expect("markdown markup regex is valid")
});

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static H1_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("h1 selector is valid"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));
static DESCRIPTION_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("description selector is valid")
});

/// Something that can enumerate the site's published pages.
pub trait ContentSource: Send + Sync {
    /// Produce a complete page list. Partial results are never returned:
    /// either every page is read or the call fails.
    fn crawl(&self) -> Result<Vec<PageRecord>>;
}

/// Crawls a static site export (HTML, Markdown and plain-text files).
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for DirectorySource {
    fn crawl(&self) -> Result<Vec<PageRecord>> {
        if !self.root.is_dir() {
            anyhow::bail!("Content directory {} does not exist", self.root.display());
        }
        tracing::info!("Crawling site content in {}", self.root.display());

        let mut pages = Vec::new();

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry
                .with_context(|| format!("Failed to walk {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(kind) = PageKind::detect(path) else {
                continue;
            };

            if let Ok(meta) = entry.metadata() {
                if meta.len() > MAX_PAGE_BYTES {
                    tracing::debug!("Skipping oversized page {}", path.display());
                    continue;
                }
            }

            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    // Non-UTF-8 files are not pages
                    tracing::debug!("Skipping unreadable page {}: {e}", path.display());
                    continue;
                }
            };

            let id = page_id(&self.root, path);
            let fallback_title = path
                .file_stem()
                .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
                .unwrap_or_else(|| id.clone());

            pages.push(match kind {
                PageKind::Html => parse_html(id, &raw, &fallback_title),
                PageKind::Markdown => parse_markdown(id, &raw, &fallback_title),
                PageKind::Text => parse_text(id, &raw, &fallback_title),
            });
        }

        tracing::info!("Crawled {} pages", pages.len());
        Ok(pages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Html,
    Markdown,
    Text,
}

impl PageKind {
    fn detect(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "html" | "htm" => Some(PageKind::Html),
            "md" | "markdown" => Some(PageKind::Markdown),
            "txt" => Some(PageKind::Text),
            _ => None,
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || matches!(name.as_ref(), "node_modules" | "assets" | "static")
}

fn page_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Extract title, description and visible text from an HTML document.
pub fn parse_html(id: String, raw: &str, fallback_title: &str) -> PageRecord {
    let cleaned = NON_CONTENT_RE.replace_all(raw, " ");
    let doc = Html::parse_document(&cleaned);

    let title = first_text(&doc, &TITLE_SEL)
        .or_else(|| first_text(&doc, &H1_SEL))
        .unwrap_or_else(|| fallback_title.to_string());

    let description = doc
        .select(&DESCRIPTION_SEL)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string);

    let body = match doc.select(&BODY_SEL).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => doc.root_element().text().collect::<Vec<_>>().join(" "),
    };

    PageRecord::new(id, title, body, description)
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Parse a Markdown page with optional `---` front matter.
pub fn parse_markdown(id: String, raw: &str, fallback_title: &str) -> PageRecord {
    let (front_matter, content) = split_front_matter(raw);

    let mut title = front_matter_value(front_matter, "title");
    let excerpt = front_matter_value(front_matter, "description")
        .or_else(|| front_matter_value(front_matter, "excerpt"));

    let mut body_lines = Vec::new();
    for line in content.lines() {
        if title.is_none() {
            if let Some(heading) = line.trim_start().strip_prefix("# ") {
                title = Some(heading.trim().to_string());
                continue;
            }
        }
        body_lines.push(line);
    }

    let body = body_lines.join("\n");
    let body = MD_LINK_RE.replace_all(&body, "$1");
    let body = MD_MARKUP_RE.replace_all(&body, "");

    PageRecord::new(
        id,
        title.unwrap_or_else(|| fallback_title.to_string()),
        body.into_owned(),
        excerpt,
    )
}

fn split_front_matter(raw: &str) -> (&str, &str) {
    let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return ("", raw);
    };
    match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            let after = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
            (&rest[..end], after)
        }
        None => ("", raw),
    }
}

fn front_matter_value(front_matter: &str, key: &str) -> Option<String> {
    front_matter.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if k.trim() != key {
            return None;
        }
        let v = v.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

/// Plain text: the first non-empty line is the title.
pub fn parse_text(id: String, raw: &str, fallback_title: &str) -> PageRecord {
    let mut lines = raw.lines().skip_while(|l| l.trim().is_empty());
    let title = lines
        .next()
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| fallback_title.to_string());
    let body = lines.collect::<Vec<_>>().join("\n");
    PageRecord::new(id, title, body, None)
}
