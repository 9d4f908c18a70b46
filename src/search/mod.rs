//! Lexical relevance ranking over the crawled site corpus.

pub mod keywords;
pub mod scorer;
pub mod stem;
pub mod synonyms;
pub mod topics;

pub use keywords::{extract_keywords, KeywordSet};
pub use scorer::{rank, Match};
pub use stem::stem;
pub use synonyms::expand;
pub use topics::{classify, is_external_topic, ExternalTopic, TopicDomain};
