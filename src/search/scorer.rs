use serde::Serialize;

use crate::corpus::Corpus;
use crate::models::PageRecord;
use crate::search::keywords::KeywordSet;
use crate::search::stem::stem;

/// Only this many leading body characters are scored per page.
pub const BODY_SCORE_CHARS: usize = 2000;
/// Weight per exact keyword occurrence in the haystack.
pub const KEYWORD_WEIGHT: u64 = 20;
/// Weight per stem occurrence in the haystack.
pub const STEM_WEIGHT: u64 = 10;
/// Flat bonus when the keyword appears in the title.
pub const TITLE_BONUS: u64 = 200;
/// A page must score strictly above this to be returned.
pub const MIN_SCORE: u64 = 15;

/// A page that qualified for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub score: u64,
    pub page_id: String,
    pub title: String,
    pub excerpt: Option<String>,
}

/// Rank the corpus for a keyword set and keep the best `top_k` pages.
///
/// Pages are scored independently, admitted when `score > MIN_SCORE`, and
/// stable-sorted by descending score so equal scores keep corpus order.
/// `top_k` below one is treated as one.
///
/// Callers must not pass an empty keyword set; an empty query has no topic
/// and ranking it would only return nothing.
pub fn rank(keywords: &KeywordSet, corpus: &Corpus, top_k: usize) -> Vec<Match> {
    let stems: Vec<(&str, String)> = keywords.iter().map(|w| (w, stem(w))).collect();

    let mut matches: Vec<Match> = corpus
        .pages()
        .iter()
        .filter_map(|page| {
            let score = score_page(page, &stems);
            (score > MIN_SCORE).then(|| Match {
                score,
                page_id: page.id.clone(),
                title: page.title.clone(),
                excerpt: page.excerpt.clone(),
            })
        })
        .collect();

    // sort_by is stable: ties keep corpus order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(top_k.max(1));
    matches
}

/// Score one page against `(keyword, stem)` pairs.
pub fn score_page(page: &PageRecord, stems: &[(&str, String)]) -> u64 {
    let title = page.title.to_lowercase();
    let haystack = build_haystack(page, &title);

    let mut score: u64 = 0;
    for (word, word_stem) in stems {
        score = score.saturating_add(count_occurrences(&haystack, word) * KEYWORD_WEIGHT);
        score = score.saturating_add(count_occurrences(&haystack, word_stem) * STEM_WEIGHT);
        if !word.is_empty() && title.contains(word) {
            score = score.saturating_add(TITLE_BONUS);
        }
    }
    score
}

fn build_haystack(page: &PageRecord, lower_title: &str) -> String {
    let body = prefix_chars(&page.body, BODY_SCORE_CHARS).to_lowercase();
    let mut haystack = String::with_capacity(lower_title.len() + body.len() + 2);
    haystack.push_str(lower_title);
    haystack.push(' ');
    haystack.push_str(&body);
    if let Some(excerpt) = &page.excerpt {
        haystack.push(' ');
        haystack.push_str(&excerpt.to_lowercase());
    }
    haystack
}

/// Non-overlapping left-to-right substring count; an empty needle counts zero.
fn count_occurrences(haystack: &str, needle: &str) -> u64 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as u64
}

fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
