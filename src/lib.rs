//! # site-chat
//!
//! Backend for a chat widget embedded in a website. Visitor questions are
//! matched against the site's own pages with a small lexical ranker, and the
//! best page is handed to an OpenAI-compatible LLM as context.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────┐
//!        │   Message    │
//!        └──────┬───────┘
//!               ▼
//!     ┌───────────────────┐   weather, news, ...
//!     │ External topics?  │──────────────────────▶ fixed reply
//!     └─────────┬─────────┘
//!               ▼
//!     ┌───────────────────┐   nothing left
//!     │ Keywords          │──────────────────────▶ guidance reply
//!     │ (stopwords, ≥3)   │
//!     └─────────┬─────────┘
//!               ▼
//!     ┌───────────────────┐
//!     │ Synonym expansion │
//!     └─────────┬─────────┘
//!               ▼
//!     ┌───────────────────┐   corpus empty → crawl once
//!     │ Scorer            │
//!     │ +20 word, +10 stem│
//!     │ +200 title, >15   │
//!     └─────────┬─────────┘
//!               ▼
//!     ┌───────────────────┐
//!     │ Context + LLM     │
//!     └─────────┬─────────┘
//!               ▼
//!     ┌───────────────────┐
//!     │ HTML + "Mehr dazu"│
//!     └───────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment config and the persisted chat settings
//! - [`models`] - Page records and request/response types
//! - [`corpus`] - Corpus snapshot, crawler and page link resolution
//! - [`search`] - Keywords, stemming, synonyms, topic rules and scoring
//! - [`llm`] - Prompt assembly and the completion client
//! - [`render`] - Answer HTML: escaping, "Mehr dazu" links, auto-linking
//! - [`api`] - Axum handlers for the widget and the admin surface
//! - [`state`] - Shared application state

use axum::routing::{get, post};
use axum::Router;

pub mod api;
pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod models;
pub mod render;
pub mod search;
pub mod state;

use state::AppState;

/// All HTTP routes of the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(api::chat::chat))
        .route("/api/widget", get(api::chat::widget))
        .route(
            "/api/admin/settings",
            get(api::admin::get_settings).put(api::admin::update_settings),
        )
        .route("/api/admin/crawl", post(api::admin::crawl))
        .route("/api/health", get(api::admin::health))
        .with_state(state)
}
