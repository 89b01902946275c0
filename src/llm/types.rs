use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::env;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderIdentity {
    OpenAI,
    Anthropic,
    Google,
}

impl ProviderIdentity {
    pub const ALL: [ProviderIdentity; 3] = [Self::OpenAI, Self::Anthropic, Self::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Model used when a request does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-3-7-sonnet-20250219",
            Self::Google => "gemini-2.0-flash-exp",
        }
    }

    /// Environment variable holding this provider's credential
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::OpenAI => env::credentials::OPENAI_API_KEY,
            Self::Anthropic => env::credentials::ANTHROPIC_API_KEY,
            Self::Google => env::credentials::GOOGLE_API_KEY,
        }
    }

    /// Guess the provider that serves a bare model name.
    pub fn infer_from_model(model: &str) -> Option<Self> {
        let model = model.trim().to_ascii_lowercase();
        if model.starts_with("gpt-")
            || model.starts_with("chatgpt")
            || ["o1", "o3", "o4"].iter().any(|p| model.starts_with(p))
        {
            Some(Self::OpenAI)
        } else if model.starts_with("claude") {
            Some(Self::Anthropic)
        } else if model.starts_with("gemini") {
            Some(Self::Google)
        } else {
            None
        }
    }
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider '{0}' (expected openai, anthropic or google)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderIdentity {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One turn of a conversation. Order within a request is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub request_id: Uuid,
    pub messages: Vec<ChatMessage>,
    /// Overrides the adapter's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Provider-specific parameters merged into the upstream body
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CompletionRequest {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Requested model, or the adapter default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }

    /// Concatenated content of every system turn, if any
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Non-system turns in caller order
    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            messages: Vec::new(),
            model: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            extra: serde_json::Map::new(),
        }
    }
}

/// Token usage statistics. `total_tokens` is always derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Normalized response from any provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    pub request_id: Uuid,
    pub content: String,
    /// Model reported by the upstream, which may differ from the one requested
    pub model: String,
    pub provider: ProviderIdentity,
    pub token_usage: TokenUsage,
    #[serde(with = "duration_millis")]
    pub latency: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Per-provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Credential. Absence disables the provider.
    pub api_key: Option<String>,
    /// Overrides the public API endpoint (proxies, tests)
    pub base_url: Option<String>,
    /// Overrides [`ProviderIdentity::default_model`]
    pub default_model: Option<String>,
}

impl ProviderSettings {
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub google: ProviderSettings,
}

impl ProvidersConfig {
    pub fn get(&self, provider: ProviderIdentity) -> &ProviderSettings {
        match provider {
            ProviderIdentity::OpenAI => &self.openai,
            ProviderIdentity::Anthropic => &self.anthropic,
            ProviderIdentity::Google => &self.google,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderIdentity) -> &mut ProviderSettings {
        match provider {
            ProviderIdentity::OpenAI => &mut self.openai,
            ProviderIdentity::Anthropic => &mut self.anthropic,
            ProviderIdentity::Google => &mut self.google,
        }
    }

    /// Fill credentials from the process environment. Variables win over file values.
    pub fn apply_env_credentials(&mut self) {
        for provider in ProviderIdentity::ALL {
            if let Some(key) = env::non_empty_var(provider.credential_var()) {
                self.get_mut(provider).api_key = Some(key);
            }
        }
    }

    /// Credential presence per provider, safe to log
    pub fn credential_presence(&self) -> HashMap<ProviderIdentity, bool> {
        ProviderIdentity::ALL
            .iter()
            .map(|p| (*p, self.get(*p).has_credential()))
            .collect()
    }
}

/// Outbound HTTP limits shared by every provider client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Generic LLM errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    /// No credential was configured; permanent for the process lifetime.
    #[error("{provider} provider is not configured")]
    ProviderDisabled { provider: ProviderIdentity },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{provider} request failed: {message}")]
    Network {
        provider: ProviderIdentity,
        message: String,
    },
    #[error("{provider} request timed out")]
    Timeout { provider: ProviderIdentity },
    #[error("{provider} API returned status {status}")]
    ApiResponse {
        provider: ProviderIdentity,
        status: u16,
        body: String,
    },
    #[error("{provider} response could not be parsed: {message}")]
    ApiParse {
        provider: ProviderIdentity,
        message: String,
    },
    #[error("{provider} returned no completion text")]
    EmptyCompletion { provider: ProviderIdentity },
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LLMError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderDisabled { .. } => "E_PROVIDER_DISABLED",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::Network { .. } => "E_UPSTREAM_REQUEST",
            Self::Timeout { .. } => "E_UPSTREAM_TIMEOUT",
            Self::ApiResponse { .. } => "E_UPSTREAM_RESPONSE",
            Self::ApiParse { .. } => "E_UPSTREAM_PARSE",
            Self::EmptyCompletion { .. } => "E_UPSTREAM_EMPTY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// True for failures of an otherwise valid upstream call
    pub fn is_call_failure(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::ApiResponse { .. }
                | Self::ApiParse { .. }
                | Self::EmptyCompletion { .. }
        )
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::ApiResponse {
                    status: 408 | 429 | 500..=599,
                    ..
                }
        )
    }

    pub fn provider(&self) -> Option<ProviderIdentity> {
        match self {
            Self::ProviderDisabled { provider }
            | Self::Network { provider, .. }
            | Self::Timeout { provider }
            | Self::ApiResponse { provider, .. }
            | Self::ApiParse { provider, .. }
            | Self::EmptyCompletion { provider } => Some(*provider),
            Self::InvalidRequest(_) | Self::HttpClientBuild(_) => None,
        }
    }
}
