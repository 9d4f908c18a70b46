use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::config::{SettingsUpdate, SettingsView};
use crate::models::CrawlResponse;
use crate::state::AppState;

/// GET /api/admin/settings - Current chat settings (API key redacted)
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    Json(SettingsView::from(&state.settings.get()))
}

/// PUT /api/admin/settings - Partial settings update
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsView>, (StatusCode, String)> {
    let settings = state.settings.update(update).map_err(|e| {
        tracing::error!("Failed to save settings: {e:#}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save settings: {e}"),
        )
    })?;

    tracing::info!("Settings updated, LLM endpoint {}", settings.api_url());
    Ok(Json(SettingsView::from(&settings)))
}

/// POST /api/admin/crawl - Re-crawl the site and replace the corpus
pub async fn crawl(
    State(state): State<AppState>,
) -> Result<Json<CrawlResponse>, (StatusCode, String)> {
    let provider = Arc::clone(&state.corpus);
    let corpus = tokio::task::spawn_blocking(move || provider.rebuild())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Crawl task failed: {e}")))?
        .map_err(|e| {
            tracing::error!("Crawl failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        })?;

    Ok(Json(CrawlResponse {
        pages: corpus.len(),
        crawled_at: corpus.crawled_at().unwrap_or_else(chrono::Utc::now),
    }))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let corpus = state.corpus.corpus();
    Json(serde_json::json!({
        "status": "ok",
        "pages": corpus.len(),
        "crawled_at": corpus.crawled_at(),
    }))
}
