use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::llm::completion::CompletionError;
use crate::models::ChatResponse;

/// Chat failures that end the request with `ok: false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Bitte gib eine Nachricht ein.")]
    EmptyMessage,
    #[error("Sicherheitsprüfung fehlgeschlagen. Bitte lade die Seite neu.")]
    InvalidToken,
    #[error("Der Assistent ist gerade ausgelastet. Bitte versuche es gleich noch einmal.")]
    Busy,
    #[error(transparent)]
    Upstream(#[from] CompletionError),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::InvalidToken => StatusCode::FORBIDDEN,
            ChatError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ChatResponse::failure(self.to_string()))).into_response()
    }
}
