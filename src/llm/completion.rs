use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ChatSettings;

/// Failures of the outbound completion call, as the visitor should see them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Verbindung fehlgeschlagen: {0}")]
    Connection(String),
    #[error("KI-Server-Fehler {0}")]
    Status(u16),
    #[error("KI hat nicht geantwortet.")]
    MalformedResponse,
}

/// Everything needed for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn from_settings(settings: &ChatSettings, system_prompt: String, user_message: String) -> Self {
        Self {
            url: settings.api_url(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            system_prompt,
            user_message,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Completion client for OpenAI-compatible endpoints (OpenWebUI, Ollama, ...).
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
}

impl HttpCompletionClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = OpenAiChatRequest {
            model: &request.model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                OpenAiMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        tracing::info!("Completion call → {} | model: {}", request.url, request.model);

        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .json(&body);
        if let Some(key) = request.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::warn!("Completion request to {} failed: {e}", request.url);
            CompletionError::Connection(describe_transport_error(&e))
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CompletionError::Connection(describe_transport_error(&e)))?;
        tracing::debug!(
            "Completion response {status}: {}",
            text.chars().take(300).collect::<String>()
        );

        if !status.is_success() {
            tracing::warn!("Completion API returned {status}");
            return Err(CompletionError::Status(status.as_u16()));
        }

        parse_completion(&text)
    }
}

/// Pull `choices[0].message.content` out of a completion body.
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let parsed: OpenAiChatResponse =
        serde_json::from_str(body).map_err(|_| CompletionError::MalformedResponse)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(CompletionError::MalformedResponse)
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Zeitüberschreitung".to_string()
    } else if e.is_connect() {
        "Server nicht erreichbar".to_string()
    } else {
        e.to_string()
    }
}
