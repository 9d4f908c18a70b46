use serde::{Deserialize, Serialize};

/// Number of body words used when a page has no explicit excerpt.
const EXCERPT_WORDS: usize = 50;

/// One crawled page of the site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRecord {
    /// Stable identifier: the page path relative to the content root.
    pub id: String,
    pub title: String,
    /// Plain text with markup stripped and whitespace collapsed.
    pub body: String,
    pub excerpt: Option<String>,
}

impl PageRecord {
    /// Build a record, deriving the excerpt from the body when none is given.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        explicit_excerpt: Option<String>,
    ) -> Self {
        let body = collapse_whitespace(&body.into());
        let excerpt = explicit_excerpt
            .map(|e| collapse_whitespace(&e))
            .filter(|e| !e.is_empty())
            .or_else(|| derive_excerpt(&body));

        Self {
            id: id.into(),
            title: collapse_whitespace(&title.into()),
            body,
            excerpt,
        }
    }
}

fn derive_excerpt(body: &str) -> Option<String> {
    let words: Vec<&str> = body.split_whitespace().take(EXCERPT_WORDS + 1).collect();
    if words.is_empty() {
        return None;
    }
    if words.len() > EXCERPT_WORDS {
        Some(format!("{} …", words[..EXCERPT_WORDS].join(" ")))
    } else {
        Some(words.join(" "))
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Chat request from the widget
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub security_token: String,
}

/// Chat response to the widget: `payload` is the HTML answer when `ok`,
/// otherwise a human-readable error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub ok: bool,
    pub payload: String,
}

impl ChatResponse {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            ok: true,
            payload: payload.into(),
        }
    }

    pub fn failure(payload: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: payload.into(),
        }
    }
}

/// Data the widget needs before the first message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetBootstrap {
    pub bot_name: String,
    pub welcome_html: String,
    pub security_token: String,
}

/// Result of a manual re-crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResponse {
    pub pages: usize,
    pub crawled_at: chrono::DateTime<chrono::Utc>,
}
