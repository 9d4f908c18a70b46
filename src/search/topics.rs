use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Question domains the site corpus cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicDomain {
    Weather,
    News,
    Stocks,
    Sports,
    Recipes,
    Travel,
}

/// Marker substrings and the domain they route to, checked in order.
const TOPIC_RULES: &[(&str, TopicDomain)] = &[
    ("wetter", TopicDomain::Weather),
    ("news", TopicDomain::News),
    ("aktien", TopicDomain::Stocks),
    ("kurs", TopicDomain::Stocks),
    ("ergebnis", TopicDomain::Sports),
    ("spiel", TopicDomain::Sports),
    ("rezept", TopicDomain::Recipes),
    ("reise", TopicDomain::Travel),
    ("flug", TopicDomain::Travel),
];

static WEATHER_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"wetter\s+(?:in|für|fuer|bei)\s+([\p{L}][\p{L}\-]*(?:\s+[\p{L}][\p{L}\-]*)?)")
        .expect("weather location regex is valid")
});

/// A query recognized as belonging to an external domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTopic {
    pub domain: TopicDomain,
    pub marker: &'static str,
    /// Place name captured after a weather trigger ("Wetter in Wien").
    pub location: Option<String>,
}

/// Classify a query against the external-topic rule table.
pub fn classify(query: &str) -> Option<ExternalTopic> {
    let lower = query.to_lowercase();
    let (marker, domain) = TOPIC_RULES
        .iter()
        .find(|(marker, _)| lower.contains(marker))?;

    let location = match domain {
        TopicDomain::Weather => extract_location(&lower),
        _ => None,
    };

    Some(ExternalTopic {
        domain: *domain,
        marker,
        location,
    })
}

/// Whether the query should bypass the corpus entirely.
pub fn is_external_topic(query: &str) -> bool {
    classify(query).is_some()
}

fn extract_location(lower_query: &str) -> Option<String> {
    WEATHER_LOCATION_RE
        .captures(lower_query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|loc| !loc.is_empty())
}
