use serde::Serialize;

/// Minimum keyword length in characters.
const MIN_KEYWORD_CHARS: usize = 3;

/// German function words that never identify a topic.
const STOPWORDS: &[&str] = &[
    "ich", "suche", "etwas", "über", "zu", "das", "der", "die", "und", "oder", "in", "auf", "mit",
    "für", "von", "ist", "bin", "sei", "hab", "habe", "mir", "dir", "wie", "geht", "es", "du", "wer",
    "bist", "dein", "mein", "ein", "eine", "einen", "dem", "den", "des", "was", "wird", "kann",
    "nicht", "auch", "sich", "bitte", "mich", "sind",
];

/// An ordered set of normalized keywords.
///
/// Keeps first-occurrence order so ranking and prompts are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyword; returns false when it was already present.
    pub fn insert(&mut self, keyword: impl Into<String>) -> bool {
        let keyword = keyword.into();
        if self.0.contains(&keyword) {
            return false;
        }
        self.0.push(keyword);
        true
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.iter().any(|k| k == keyword)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for keyword in iter {
            set.insert(keyword);
        }
        set
    }
}

/// Extract topic keywords from a raw visitor query.
///
/// Tokens are lower-cased whitespace-separated words with surrounding
/// punctuation removed. Short tokens and stopwords are dropped. An empty
/// result means the query names no topic and must not be ranked.
pub fn extract_keywords(query: &str) -> KeywordSet {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|token| !is_stopword(token))
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}
