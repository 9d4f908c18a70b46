use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::corpus::Corpus;
use crate::error::ChatError;
use crate::llm::completion::CompletionRequest;
use crate::llm::prompt::{
    build_context, build_system_prompt, build_user_message, sanitize_for_prompt,
    truncate_to_char_boundary, MAX_MESSAGE_CHARS,
};
use crate::models::{ChatRequest, ChatResponse, WidgetBootstrap};
use crate::render::{render_answer, welcome_html};
use crate::search::{classify, expand, extract_keywords, rank, Match};
use crate::state::AppState;

/// Reply when the question is about something no website covers.
pub const EXTERNAL_TOPIC_REPLY: &str = "Ich kenne nur Inhalte dieser Website. Frag nach Artikeln!";
/// Reply when the question has no usable keyword.
pub const NO_KEYWORDS_REPLY: &str =
    "Frag nach einem Thema aus der Website – z.B. 'Pagespeed' oder 'WordPress'!";

/// How a chat reply was produced
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyKind {
    ExternalTopic,
    NoKeywords,
    Answer { matches: Vec<Match> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub kind: ReplyKind,
    /// HTML shown in the widget
    pub payload: String,
}

/// POST /api/chat — answer one visitor message.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    if req.security_token != state.widget_token {
        tracing::warn!("Rejected chat message with invalid security token");
        return Err(ChatError::InvalidToken);
    }

    let reply = run_chat(&state, &req.message).await?;
    Ok(Json(ChatResponse::success(reply.payload)))
}

/// GET /api/widget — bootstrap data for the embedded widget.
pub async fn widget(State(state): State<AppState>) -> Json<WidgetBootstrap> {
    let settings = state.settings.get();
    Json(WidgetBootstrap {
        bot_name: settings.bot_name,
        welcome_html: welcome_html(&settings.welcome_message),
        security_token: state.widget_token.clone(),
    })
}

/// The chat pipeline behind [`chat`], reusable without HTTP.
pub async fn run_chat(state: &AppState, message: &str) -> Result<ChatReply, ChatError> {
    // ── Step 1: Validate and sanitize input ───────────────
    let message = prepare_message(message)?;
    let settings = state.settings.get();

    // ── Step 2: Off-site topics ───────────────────────────
    if let Some(topic) = classify(&message) {
        tracing::info!(
            "External topic {:?} (marker '{}', location {:?})",
            topic.domain,
            topic.marker,
            topic.location
        );
        return Ok(ChatReply {
            kind: ReplyKind::ExternalTopic,
            payload: EXTERNAL_TOPIC_REPLY.to_string(),
        });
    }

    // ── Step 3: Keywords ──────────────────────────────────
    let keywords = extract_keywords(&message);
    if keywords.is_empty() {
        tracing::debug!("No keywords in message");
        return Ok(ChatReply {
            kind: ReplyKind::NoKeywords,
            payload: NO_KEYWORDS_REPLY.to_string(),
        });
    }

    // ── Step 4: Corpus (rebuild once when empty) ──────────
    let corpus = current_or_rebuilt_corpus(state).await;

    // ── Step 5: Expand and rank ───────────────────────────
    let expanded = expand(&keywords);
    let matches = rank(&expanded, &corpus, settings.top_k);
    tracing::info!(
        "Chat: {} keywords ({} expanded), {} pages, {} matches",
        keywords.len(),
        expanded.len(),
        corpus.len(),
        matches.len()
    );

    // ── Step 6: Build prompt ──────────────────────────────
    let context = build_context(&matches, state.links.as_ref());
    let request = CompletionRequest::from_settings(
        &settings,
        build_system_prompt(&settings.bot_name),
        build_user_message(&message, &context),
    );

    // ── Step 7: Call the LLM ──────────────────────────────
    let answer = {
        let _permit = state
            .chat_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ChatError::Busy)?;
        state.llm.complete(&request).await?
    };

    // ── Step 8: Render ────────────────────────────────────
    let payload = render_answer(&answer, &matches, state.links.as_ref());
    Ok(ChatReply {
        kind: ReplyKind::Answer { matches },
        payload,
    })
}

// ─── Helper functions ────────────────────────────────────

fn prepare_message(message: &str) -> Result<String, ChatError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    let message = sanitize_for_prompt(&truncate_to_char_boundary(message, MAX_MESSAGE_CHARS));
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    Ok(message.to_string())
}

async fn current_or_rebuilt_corpus(state: &AppState) -> Arc<Corpus> {
    let corpus = state.corpus.corpus();
    if !corpus.is_empty() {
        return corpus;
    }

    tracing::info!("Corpus is empty, crawling before answering");
    let provider = Arc::clone(&state.corpus);
    match tokio::task::spawn_blocking(move || provider.populate_if_empty()).await {
        Ok(Ok(rebuilt)) => rebuilt,
        Ok(Err(e)) => {
            tracing::warn!("Corpus rebuild failed: {e:#}");
            corpus
        }
        Err(e) => {
            tracing::warn!("Corpus rebuild task failed: {e}");
            corpus
        }
    }
}
