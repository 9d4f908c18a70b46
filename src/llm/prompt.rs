use std::fmt::Write;

use crate::corpus::LinkResolver;
use crate::search::Match;

/// Maximum characters of a visitor message forwarded to the LLM.
pub const MAX_MESSAGE_CHARS: usize = 2000;
/// Context line used when no page matched.
pub const NO_MATCH_CONTEXT: &str = "Kein passender Artikel.";

/// Control tokens that would let page text or visitor input open a new turn.
const CONTROL_TOKENS: &[&str] = &[
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|system|>",
    "<|user|>",
    "<|assistant|>",
];

/// Remove chat-template control tokens from untrusted text.
pub fn sanitize_for_prompt(text: &str) -> String {
    let mut out = text.to_string();
    for token in CONTROL_TOKENS {
        if out.contains(token) {
            out = out.replace(token, "");
        }
    }
    out
}

pub fn truncate_to_char_boundary(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

pub fn build_system_prompt(bot_name: &str) -> String {
    let name = sanitize_for_prompt(bot_name.trim());
    if name.is_empty() {
        "Du bist ein KI-Assistent für diese Website. Antworte kurz und hilfreich.".to_string()
    } else {
        format!("Du bist {name}, ein KI-Assistent für diese Website. Antworte kurz und hilfreich.")
    }
}

/// One line per matched page (title and link, plus the excerpt when known).
pub fn build_context(matches: &[Match], links: &dyn LinkResolver) -> String {
    if matches.is_empty() {
        return NO_MATCH_CONTEXT.to_string();
    }

    let mut ctx = String::new();
    for (i, m) in matches.iter().enumerate() {
        if i > 0 {
            ctx.push('\n');
        }
        let _ = write!(
            ctx,
            "Artikel: {} – {}",
            sanitize_for_prompt(&m.title),
            links.resolve(&m.page_id)
        );
        if let Some(excerpt) = &m.excerpt {
            let _ = write!(ctx, "\nAuszug: {}", sanitize_for_prompt(excerpt));
        }
    }
    ctx
}

pub fn build_user_message(message: &str, context: &str) -> String {
    format!("{message}\nKontext: {context}")
}
