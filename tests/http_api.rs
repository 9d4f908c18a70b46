//! Router-level tests: status codes and JSON shapes of every endpoint.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{pagespeed_pages, state_with, CountingSource, StubLlm};
use site_chat::config::{ChatSettings, Config, SettingsStore};
use site_chat::corpus::crawl::DirectorySource;
use site_chat::corpus::{CorpusStore, SiteLinkResolver};
use site_chat::state::AppState;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn app_with_llm(llm: Arc<StubLlm>) -> (Router, String) {
    let (source, _) = CountingSource::new(pagespeed_pages());
    let state = state_with(source, llm);
    let token = state.widget_token.clone();
    (site_chat::router(state), token)
}

// ─── Widget ──────────────────────────────────────────────

#[tokio::test]
async fn test_widget_bootstrap() {
    let (app, token) = app_with_llm(StubLlm::answering("ok"));

    let (status, body) = send(&app, "GET", "/api/widget", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bot_name"], "Website-Assistent");
    assert_eq!(body["security_token"], token);
    assert!(!body["welcome_html"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_answer() {
    let (app, token) = app_with_llm(StubLlm::answering("Bilder komprimieren."));

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "Pagespeed?", "security_token": token })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let payload = body["payload"].as_str().unwrap();
    assert!(payload.starts_with("Bilder komprimieren."));
    assert!(payload.contains("Mehr dazu: "));
}

#[tokio::test]
async fn test_chat_rejects_wrong_token() {
    let llm = StubLlm::answering("ok");
    let (app, _) = app_with_llm(llm.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "Pagespeed?", "security_token": "forged" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_chat_rejects_missing_token() {
    let (app, _) = app_with_llm(StubLlm::answering("ok"));

    let (status, _) = send(&app, "POST", "/api/chat", Some(json!({ "message": "Pagespeed?" }))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_empty_message() {
    let (app, token) = app_with_llm(StubLlm::answering("ok"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "  ", "security_token": token })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "ok": false, "payload": "Bitte gib eine Nachricht ein." }));
}

#[tokio::test]
async fn test_chat_external_topic_is_ok() {
    let (app, token) = app_with_llm(StubLlm::answering("ok"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "Aktuelle News?", "security_token": token })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(
        body["payload"],
        "Ich kenne nur Inhalte dieser Website. Frag nach Artikeln!"
    );
}

#[tokio::test]
async fn test_chat_upstream_failure_is_bad_gateway() {
    let llm = StubLlm::failing(site_chat::llm::completion::CompletionError::MalformedResponse);
    let (app, token) = app_with_llm(llm);

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "message": "Pagespeed?", "security_token": token })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "ok": false, "payload": "KI hat nicht geantwortet." }));
}

// ─── Admin ───────────────────────────────────────────────

#[tokio::test]
async fn test_settings_roundtrip_redacts_key() {
    let (app, _) = app_with_llm(StubLlm::answering("ok"));

    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(json!({
            "protocol": "https://",
            "host": "llm.example.com",
            "port": "443",
            "api_key": "secret",
            "top_k": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_url"], "https://llm.example.com/api/v1/chat/completions");
    assert_eq!(body["has_api_key"], true);
    assert!(body.get("api_key").is_none());

    let (status, body) = send(&app, "GET", "/api/admin/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["protocol"], "https");
    assert_eq!(body["top_k"], 3);
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn test_crawl_and_health_over_directory() {
    let site = tempfile::tempdir().unwrap();
    std::fs::write(
        site.path().join("index.html"),
        "<html><head><title>Start</title></head><body><p>Willkommen</p></body></html>",
    )
    .unwrap();
    std::fs::write(site.path().join("blog.md"), "# Blog\n\nNeuigkeiten.").unwrap();

    let state = AppState::with_parts(
        Config::default(),
        SettingsStore::in_memory(ChatSettings::default()),
        Arc::new(CorpusStore::in_memory(DirectorySource::new(site.path()))),
        Arc::new(SiteLinkResolver::new(None)),
        StubLlm::answering("ok"),
    );
    let app = site_chat::router(state);

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"], 0);

    let (status, body) = send(&app, "POST", "/api/admin/crawl", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"], 2);
    assert!(body["crawled_at"].is_string());

    let (_, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pages"], 2);
}
