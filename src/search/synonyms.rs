use super::keywords::KeywordSet;

/// Hand-curated related terms per canonical keyword.
///
/// No related term may itself be a key; that keeps [`expand`] from chaining.
const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "pagespeed",
        &["page speed", "pagespeedinsights", "ladezeit", "performance", "optimierung"],
    ),
    ("tutorial", &["anleitung", "guide", "hilfe", "tunen"]),
    ("seo", &["suchmaschinenoptimierung", "ranking", "google"]),
    ("wordpress", &["plugin", "theme", "gutenberg"]),
    ("hosting", &["server", "webspace", "provider"]),
    ("sicherheit", &["security", "firewall", "backup"]),
];

/// Related terms for a single keyword, if it is a canonical key.
pub fn synonyms_for(keyword: &str) -> Option<&'static [&'static str]> {
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == keyword)
        .map(|(_, terms)| *terms)
}

/// Union the related terms of every canonical keyword into the set.
///
/// The original keywords keep their positions; new terms are appended in
/// table order.
pub fn expand(keywords: &KeywordSet) -> KeywordSet {
    let mut expanded = keywords.clone();
    for keyword in keywords.iter() {
        if let Some(terms) = synonyms_for(keyword) {
            for term in terms {
                expanded.insert(*term);
            }
        }
    }
    expanded
}
