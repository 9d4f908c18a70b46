use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path of the OpenAI-compatible completion endpoint on the LLM host.
pub const COMPLETIONS_PATH: &str = "/api/v1/chat/completions";
/// Bounds for the outbound LLM request timeout.
pub const MIN_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Process-level configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where settings and the corpus snapshot are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Root of the static site export that gets crawled
    pub content_dir: PathBuf,
    /// Public base URL of the site, used to link matched pages
    pub site_url: Option<String>,
    /// Maximum concurrent LLM calls
    pub max_concurrent_chats: usize,
    /// Initial chat settings when no settings file exists yet
    pub chat: ChatSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            content_dir: PathBuf::from("./site"),
            site_url: None,
            max_concurrent_chats: 3,
            chat: ChatSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SITE_CHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("SITE_CHAT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("SITE_CHAT_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("SITE_CHAT_SITE_URL") {
            config.site_url = Some(url);
        }
        if let Ok(val) = std::env::var("SITE_CHAT_MAX_CONCURRENT_CHATS") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_concurrent_chats = v.max(1);
            }
        }

        // Chat settings seed
        if let Ok(val) = std::env::var("LLM_PROTOCOL") {
            match Protocol::parse(&val) {
                Some(p) => config.chat.protocol = p,
                None => tracing::warn!("Ignoring unknown LLM_PROTOCOL '{val}'"),
            }
        }
        if let Ok(host) = std::env::var("LLM_HOST") {
            config.chat.host = host;
        }
        if let Ok(port) = std::env::var("LLM_PORT") {
            config.chat.port = port;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.chat.model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.chat.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.chat.request_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("CHAT_TOP_K") {
            if let Ok(v) = val.parse() {
                config.chat.top_k = v;
            }
        }
        if let Ok(name) = std::env::var("CHAT_BOT_NAME") {
            config.chat.bot_name = name;
        }
        if let Ok(welcome) = std::env::var("CHAT_WELCOME") {
            config.chat.welcome_message = welcome;
        }

        config.chat = config.chat.normalized();
        config
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("corpus.json")
    }
}

/// Scheme used to reach the LLM host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[serde(alias = "http://")]
    Http,
    #[serde(alias = "https://")]
    Https,
}

impl Protocol {
    /// Accepts `http`, `https`, and the `scheme://` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_end_matches("://").to_lowercase().as_str() {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    pub fn default_port(self) -> &'static str {
        match self {
            Protocol::Http => "80",
            Protocol::Https => "443",
        }
    }
}

/// Operator-editable chat settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    pub protocol: Protocol,
    pub host: String,
    /// Empty, or equal to the protocol's default port, means "omit from URL".
    pub port: String,
    pub model: String,
    pub api_key: Option<String>,
    pub welcome_message: String,
    pub bot_name: String,
    /// How many matched pages go into the prompt
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: "localhost".to_string(),
            port: "8080".to_string(),
            model: "gemma3:latest".to_string(),
            api_key: None,
            welcome_message: "Hallo! Ich bin dein KI-Assistent.\nFrag mich alles über diese Website!"
                .to_string(),
            bot_name: "Website-Assistent".to_string(),
            top_k: 1,
            temperature: 0.7,
            max_tokens: 120,
            request_timeout_secs: MAX_TIMEOUT_SECS,
        }
    }
}

impl ChatSettings {
    /// Full URL of the completion endpoint.
    pub fn api_url(&self) -> String {
        let host = self
            .host
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let port = self.port.trim();

        let mut url = format!("{}://{host}", self.protocol.scheme());
        if !port.is_empty() && port != self.protocol.default_port() {
            url.push(':');
            url.push_str(port);
        }
        url.push_str(COMPLETIONS_PATH);
        url
    }

    /// Clamp values into their supported ranges.
    pub fn normalized(mut self) -> Self {
        self.top_k = self.top_k.max(1);
        self.request_timeout_secs = self
            .request_timeout_secs
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        self.temperature = self.temperature.clamp(0.0, 2.0);
        self.max_tokens = self.max_tokens.max(1);
        self.model = self.model.trim().to_string();
        self.api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(protocol) = update.protocol {
            self.protocol = protocol;
        }
        if let Some(host) = update.host {
            self.host = host;
        }
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(api_key) = update.api_key {
            // empty string clears the key
            self.api_key = Some(api_key);
        }
        if let Some(welcome) = update.welcome_message {
            self.welcome_message = welcome;
        }
        if let Some(name) = update.bot_name {
            self.bot_name = name;
        }
        if let Some(top_k) = update.top_k {
            self.top_k = top_k;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        *self = std::mem::take(self).normalized();
    }
}

/// Partial settings update from the admin API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub protocol: Option<Protocol>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub welcome_message: Option<String>,
    pub bot_name: Option<String>,
    pub top_k: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

/// Settings view with the API key redacted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsView {
    pub protocol: Protocol,
    pub host: String,
    pub port: String,
    pub model: String,
    pub has_api_key: bool,
    pub welcome_message: String,
    pub bot_name: String,
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub api_url: String,
}

impl From<&ChatSettings> for SettingsView {
    fn from(s: &ChatSettings) -> Self {
        Self {
            protocol: s.protocol,
            host: s.host.clone(),
            port: s.port.clone(),
            model: s.model.clone(),
            has_api_key: s.api_key.is_some(),
            welcome_message: s.welcome_message.clone(),
            bot_name: s.bot_name.clone(),
            top_k: s.top_k,
            temperature: s.temperature,
            max_tokens: s.max_tokens,
            request_timeout_secs: s.request_timeout_secs,
            api_url: s.api_url(),
        }
    }
}

/// Chat settings shared by all requests, persisted as JSON.
pub struct SettingsStore {
    current: RwLock<ChatSettings>,
    persist_path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn in_memory(settings: ChatSettings) -> Self {
        Self {
            current: RwLock::new(settings.normalized()),
            persist_path: None,
        }
    }

    /// Load the settings file, or start from `seed` when there is none.
    pub fn open(persist_path: PathBuf, seed: ChatSettings) -> Result<Self> {
        let settings = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .with_context(|| format!("Failed to read {}", persist_path.display()))?;
            serde_json::from_str::<ChatSettings>(&data)
                .with_context(|| format!("Invalid settings file {}", persist_path.display()))?
        } else {
            seed
        };

        Ok(Self {
            current: RwLock::new(settings.normalized()),
            persist_path: Some(persist_path),
        })
    }

    /// A copy of the current settings.
    pub fn get(&self) -> ChatSettings {
        self.current.read().clone()
    }

    pub fn update(&self, update: SettingsUpdate) -> Result<ChatSettings> {
        let updated = {
            let mut settings = self.current.write();
            settings.apply(update);
            settings.clone()
        };
        self.persist(&updated)?;
        Ok(updated)
    }

    /// Persist via temp file + rename.
    fn persist(&self, settings: &ChatSettings) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(protocol: Protocol, host: &str, port: &str) -> ChatSettings {
        ChatSettings {
            protocol,
            host: host.into(),
            port: port.into(),
            ..ChatSettings::default()
        }
    }

    // ─── URL assembly ────────────────────────────────────

    #[test]
    fn test_api_url_with_custom_port() {
        let s = settings(Protocol::Http, "localhost", "8080");
        assert_eq!(s.api_url(), "http://localhost:8080/api/v1/chat/completions");
    }

    #[test]
    fn test_api_url_omits_default_port() {
        let s = settings(Protocol::Https, "chat.example.com", "443");
        assert_eq!(s.api_url(), "https://chat.example.com/api/v1/chat/completions");
        let s = settings(Protocol::Http, "chat.example.com", "80");
        assert_eq!(s.api_url(), "http://chat.example.com/api/v1/chat/completions");
    }

    #[test]
    fn test_api_url_omits_empty_port() {
        let s = settings(Protocol::Https, "chat.example.com", " ");
        assert_eq!(s.api_url(), "https://chat.example.com/api/v1/chat/completions");
    }

    #[test]
    fn test_api_url_keeps_non_default_port_for_https() {
        let s = settings(Protocol::Https, "chat.example.com", "80");
        assert_eq!(s.api_url(), "https://chat.example.com:80/api/v1/chat/completions");
    }

    #[test]
    fn test_api_url_tolerates_scheme_and_slash_in_host() {
        let s = settings(Protocol::Https, "https://chat.example.com/", "");
        assert_eq!(s.api_url(), "https://chat.example.com/api/v1/chat/completions");
    }

    // ─── Protocol ────────────────────────────────────────

    #[test]
    fn test_protocol_parse_variants() {
        assert_eq!(Protocol::parse("https://"), Some(Protocol::Https));
        assert_eq!(Protocol::parse("HTTP"), Some(Protocol::Http));
        assert_eq!(Protocol::parse("ftp"), None);
    }

    #[test]
    fn test_protocol_deserializes_legacy_spelling() {
        let p: Protocol = serde_json::from_str("\"https://\"").unwrap();
        assert_eq!(p, Protocol::Https);
        let p: Protocol = serde_json::from_str("\"http\"").unwrap();
        assert_eq!(p, Protocol::Http);
    }

    // ─── Normalization and updates ───────────────────────

    #[test]
    fn test_normalized_clamps_ranges() {
        let s = ChatSettings {
            top_k: 0,
            request_timeout_secs: 5,
            api_key: Some("  ".into()),
            ..ChatSettings::default()
        }
        .normalized();
        assert_eq!(s.top_k, 1);
        assert_eq!(s.request_timeout_secs, MIN_TIMEOUT_SECS);
        assert_eq!(s.api_key, None);

        let s = ChatSettings {
            request_timeout_secs: 10_000,
            ..ChatSettings::default()
        }
        .normalized();
        assert_eq!(s.request_timeout_secs, MAX_TIMEOUT_SECS);
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut s = ChatSettings::default();
        s.apply(SettingsUpdate {
            model: Some("llama3.2".into()),
            top_k: Some(2),
            ..SettingsUpdate::default()
        });
        assert_eq!(s.model, "llama3.2");
        assert_eq!(s.top_k, 2);
        assert_eq!(s.host, "localhost");
    }

    #[test]
    fn test_update_empty_api_key_clears() {
        let mut s = ChatSettings {
            api_key: Some("secret".into()),
            ..ChatSettings::default()
        };
        s.apply(SettingsUpdate {
            api_key: Some(String::new()),
            ..SettingsUpdate::default()
        });
        assert_eq!(s.api_key, None);
    }

    #[test]
    fn test_view_redacts_key() {
        let s = ChatSettings {
            api_key: Some("secret".into()),
            ..ChatSettings::default()
        };
        let view = SettingsView::from(&s);
        assert!(view.has_api_key);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("/api/v1/chat/completions"));
    }

    // ─── Persistence ─────────────────────────────────────

    #[test]
    fn test_store_persists_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::open(path.clone(), ChatSettings::default()).unwrap();
        store
            .update(SettingsUpdate {
                host: Some("chat.example.com".into()),
                ..SettingsUpdate::default()
            })
            .unwrap();

        let reopened = SettingsStore::open(path, ChatSettings::default()).unwrap();
        assert_eq!(reopened.get().host, "chat.example.com");
    }

    #[test]
    fn test_store_uses_seed_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let seed = ChatSettings {
            model: "mistral".into(),
            ..ChatSettings::default()
        };
        let store = SettingsStore::open(dir.path().join("settings.json"), seed).unwrap();
        assert_eq!(store.get().model, "mistral");
    }

    #[test]
    fn test_partial_settings_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"host":"llm.internal","protocol":"https://"}"#).unwrap();
        let store = SettingsStore::open(path, ChatSettings::default()).unwrap();
        let s = store.get();
        assert_eq!(s.host, "llm.internal");
        assert_eq!(s.protocol, Protocol::Https);
        assert_eq!(s.top_k, 1);
    }
}
