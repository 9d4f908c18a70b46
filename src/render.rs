//! HTML post-processing of answers shown in the widget.

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use std::sync::LazyLock;

use crate::corpus::LinkResolver;
use crate::search::Match;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"')]+"#).expect("url regex is valid"));

fn anchor(href: &str, label: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
        encode_double_quoted_attribute(href),
        encode_text(label)
    )
}

/// Escape plain text as HTML and wrap every `http(s)://` URL in an anchor.
///
/// URLs are found before escaping, so surrounding `<…>` or quotes never end
/// up inside a link.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in URL_RE.find_iter(text) {
        let url = trim_trailing_punctuation(found.as_str());
        out.push_str(&encode_text(&text[last..found.start()]));
        out.push_str(&anchor(url, url));
        last = found.start() + url.len();
    }
    out.push_str(&encode_text(&text[last..]));
    out
}

/// Sentence punctuation directly after a URL is not part of it.
fn trim_trailing_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

/// Turn the raw LLM answer into widget HTML.
///
/// Raw occurrences of the matched links are removed (they are re-added as a
/// "Mehr dazu" anchor), the rest is escaped and its URLs are linked.
pub fn render_answer(answer: &str, matches: &[Match], links: &dyn LinkResolver) -> String {
    let resolved: Vec<(String, &Match)> = matches
        .iter()
        .map(|m| (links.resolve(&m.page_id), m))
        .collect();

    let mut text = answer.to_string();
    for (url, _) in &resolved {
        if url != "#" && !url.is_empty() {
            text = text.replace(url.as_str(), "");
        }
    }

    let mut html = linkify(text.trim());

    if !resolved.is_empty() {
        let more = resolved
            .iter()
            .map(|(url, m)| anchor(url, &m.title))
            .collect::<Vec<_>>()
            .join(", ");
        html.push_str("\n\nMehr dazu: ");
        html.push_str(&more);
    }

    html
}

/// Welcome text as HTML: escaped, newlines turned into `<br>`.
pub fn welcome_html(welcome: &str) -> String {
    encode_text(welcome)
        .replace("\r\n", "\n")
        .replace('\n', "<br>\n")
}
