/// Inflectional endings stripped by [`stem`]. Trying the longest first gives
/// the same result as the leftmost match of an end-anchored alternation.
const SUFFIXES: &[&str] = &["lich", "ung", "en", "es", "s"];

/// Reduce a token to an approximate root by stripping one German suffix.
///
/// This is a recall widener, not a linguistic stemmer: `"optimieren"` becomes
/// `"optimier"`, which is enough to hit `"Optimierung"` in a page body.
/// Tokens shorter than three characters are returned as-is, and a token is
/// never stripped down to nothing.
pub fn stem(token: &str) -> String {
    let word = token.trim().to_lowercase();
    if word.chars().count() < 3 {
        return word;
    }

    for suffix in SUFFIXES {
        if let Some(root) = word.strip_suffix(suffix) {
            if root.is_empty() {
                return word;
            }
            return root.to_string();
        }
    }

    word
}
