//! # Gateway facade
//!
//! Wires the provider registry, dispatcher, circuit breaker and intent router
//! together behind the three entry points an HTTP layer needs:
//!
//! - [`Gateway::classify`]: intent label with primary/fallback failover
//! - [`Gateway::complete`]: one completion on a selected provider
//! - [`Gateway::respond`]: classify, select a provider from the intent, complete
//!
//! ```text
//! text ──> IntentRouter ──> IntentResult ──> select_provider ──> Dispatcher ──> adapter
//!            │  primary (breaker-guarded)
//!            └─ fallback (unguarded)
//! ```
//!
//! Input is validated here, before any provider is looked up or called.

use crate::env;
use crate::intent::{
    ClassificationConfig, ClassifierModel, IntentError, IntentResult, IntentRouter,
    ModelClassifier,
};
use crate::llm::{
    ChatMessage, CompletionRequest, CompletionResult, Dispatcher, HttpConfig, LLMError,
    ProviderIdentity, ProviderRegistry, ProvidersConfig, select_provider,
};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub classification: ClassificationConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub http: HttpConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value for {var}: {message}")]
    InvalidOverride { var: &'static str, message: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl GatewayConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay credentials and classifier/breaker settings from the environment.
    ///
    /// Variables win over file values. Blank variables are ignored.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.providers.apply_env_credentials();

        if let Some(value) = env::non_empty_var(env::overrides::PRIMARY_MODEL) {
            self.classification.primary = parse_override(env::overrides::PRIMARY_MODEL, &value)?;
        }
        if let Some(value) = env::non_empty_var(env::overrides::FALLBACK_MODEL) {
            self.classification.fallback = parse_override(env::overrides::FALLBACK_MODEL, &value)?;
        }
        if let Some(value) = env::non_empty_var(env::overrides::BREAKER_THRESHOLD) {
            self.circuit_breaker.failure_threshold =
                parse_override(env::overrides::BREAKER_THRESHOLD, &value)?;
        }
        if let Some(value) = env::non_empty_var(env::overrides::BREAKER_TIMEOUT) {
            self.circuit_breaker.recovery_timeout_secs =
                parse_override(env::overrides::BREAKER_TIMEOUT, &value)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.classification.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "classification.max_tokens must be at least 1".to_string(),
            ));
        }
        if self.classification.max_text_chars == 0 {
            return Err(ConfigError::Invalid(
                "classification.max_text_chars must be at least 1".to_string(),
            ));
        }
        if self.http.request_timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http timeouts must be non-zero".to_string()));
        }

        for provider in ProviderIdentity::ALL {
            if let Some(base_url) = &self.providers.get(provider).base_url {
                url::Url::parse(base_url).map_err(|e| {
                    ConfigError::Invalid(format!("providers.{provider}.base_url: {e}"))
                })?;
            }
        }

        Ok(())
    }

    /// Copy with every credential replaced, safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for provider in ProviderIdentity::ALL {
            let settings = config.providers.get_mut(provider);
            if settings.has_credential() {
                settings.api_key = Some(REDACTED.to_string());
            }
        }
        config
    }
}

fn parse_override<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidOverride {
            var,
            message: e.to_string(),
        })
}

/// Input rejected before any provider is contacted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,
    #[error("text is {actual} characters long, limit is {max}")]
    TextTooLong { max: usize, actual: usize },
    #[error("messages must not be empty")]
    EmptyMessages,
    #[error("message {index} has empty content")]
    EmptyMessageContent { index: usize },
    #[error("temperature {0} is outside 0.0..=2.0")]
    TemperatureOutOfRange(f32),
    #[error("max_tokens must be at least 1")]
    InvalidMaxTokens,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upstream(#[from] LLMError),
    #[error(transparent)]
    Classification(#[from] IntentError),
}

impl GatewayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Upstream(err) => err.error_code(),
            Self::Classification(err) => err.error_code(),
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Upstream(err) => err.retryable(),
            Self::Classification(err) => err.retryable(),
        }
    }

    /// HTTP status an outer layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Upstream(LLMError::InvalidRequest(_)) => 400,
            Self::Upstream(LLMError::ProviderDisabled { .. }) | Self::Classification(_) => 503,
            Self::Upstream(LLMError::Timeout { .. }) => 504,
            Self::Upstream(_) => 502,
        }
    }

    /// Error body for callers; both causes are kept for classification failures
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": self.status_code(),
            "retryable": self.retryable(),
        });
        if let Self::Classification(IntentError::AllProvidersUnavailable {
            primary_error,
            fallback_error,
        }) = self
        {
            body["primary_error"] = primary_error.clone().into();
            body["fallback_error"] = fallback_error.clone().into();
        }
        body
    }
}

/// Parameters of a single completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionParams {
    /// Provider name; unknown names are ignored
    pub provider: Option<String>,
    /// Intent label used for provider selection
    pub intent: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionParams {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.messages.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }
        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.content.trim().is_empty())
        {
            return Err(ValidationError::EmptyMessageContent { index });
        }
        if let Some(temperature) = self.temperature
            && !(temperature.is_finite() && (0.0..=2.0).contains(&temperature))
        {
            return Err(ValidationError::TemperatureOutOfRange(temperature));
        }
        if self.max_tokens == Some(0) {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }

    fn into_request(self) -> CompletionRequest {
        let mut request = CompletionRequest::new(self.messages);
        if let Some(model) = self.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

/// Classification and the completion it was routed to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedResponse {
    pub intent: IntentResult,
    pub completion: CompletionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: ProviderIdentity,
    pub enabled: bool,
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub providers: Vec<ProviderStatus>,
    pub primary_classifier: ClassifierModel,
    pub fallback_classifier: ClassifierModel,
    pub circuit_breaker: CircuitBreakerSnapshot,
}

/// Entry point shared by every concurrent request
#[derive(Debug, Clone)]
pub struct Gateway {
    config: GatewayConfig,
    dispatcher: Dispatcher,
    router: IntentRouter,
}

impl Gateway {
    /// Validate `config` and initialise every provider that has a credential
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = ProviderRegistry::from_config(&config.providers, &config.http);
        Ok(Self::from_parts(config, registry))
    }

    /// Build around an existing registry
    pub fn from_parts(config: GatewayConfig, registry: ProviderRegistry) -> Self {
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let classification = &config.classification;

        let primary = ModelClassifier::new(
            dispatcher.clone(),
            classification.primary.clone(),
            classification.max_tokens,
        );
        let fallback = ModelClassifier::new(
            dispatcher.clone(),
            classification.fallback.clone(),
            classification.max_tokens,
        );
        let breaker = CircuitBreaker::new(config.circuit_breaker);
        let router = IntentRouter::new(Arc::new(primary), Arc::new(fallback), Arc::new(breaker));

        info!(
            primary = %classification.primary,
            fallback = %classification.fallback,
            enabled = ?dispatcher.registry().enabled(),
            "gateway initialized"
        );

        Self {
            config,
            dispatcher,
            router,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    pub async fn classify(&self, text: &str) -> Result<IntentResult, GatewayError> {
        self.validate_text(text)?;
        Ok(self.router.classify(text).await?)
    }

    /// Select a provider from the preference and intent, then dispatch.
    ///
    /// Failures are returned as-is; no other provider is tried.
    pub async fn complete(&self, params: CompletionParams) -> Result<CompletionResult, GatewayError> {
        params.validate()?;

        let provider = select_provider(params.provider.as_deref(), params.intent.as_deref());
        debug!(%provider, intent = ?params.intent, "provider selected");

        Ok(self
            .dispatcher
            .dispatch(provider, params.into_request())
            .await?)
    }

    /// Classify `text`, then answer it on the provider its intent selects
    pub async fn respond(
        &self,
        text: &str,
        provider_preference: Option<&str>,
    ) -> Result<RoutedResponse, GatewayError> {
        let intent = self.classify(text).await?;

        let params = CompletionParams {
            provider: provider_preference.map(str::to_string),
            intent: Some(intent.intent.clone()),
            ..CompletionParams::new(vec![ChatMessage::user(text)])
        };
        let completion = self.complete(params).await?;

        Ok(RoutedResponse { intent, completion })
    }

    pub async fn status(&self) -> GatewayStatus {
        let registry = self.dispatcher.registry();
        let providers = ProviderIdentity::ALL
            .into_iter()
            .map(|provider| {
                let default_model = match registry.get(provider) {
                    Some(adapter) => adapter.default_model().to_string(),
                    None => self
                        .config
                        .providers
                        .get(provider)
                        .default_model
                        .clone()
                        .unwrap_or_else(|| provider.default_model().to_string()),
                };
                ProviderStatus {
                    provider,
                    enabled: registry.is_enabled(provider),
                    default_model,
                }
            })
            .collect();

        GatewayStatus {
            providers,
            primary_classifier: self.config.classification.primary.clone(),
            fallback_classifier: self.config.classification.fallback.clone(),
            circuit_breaker: self.router.breaker().snapshot().await,
        }
    }

    fn validate_text(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let max = self.config.classification.max_text_chars;
        let actual = text.chars().count();
        if actual > max {
            return Err(ValidationError::TextTooLong { max, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_utils::{MockProvider, network_error};
    use crate::resilience::CircuitState;
    use serial_test::serial;
    use tempfile::TempDir;

    const CLASSIFICATION: &str = r#"{"intent":"greeting","confidence":0.98,"target_model":"gpt-4o"}"#;

    struct Mocks {
        openai: Arc<MockProvider>,
        anthropic: Arc<MockProvider>,
        google: Arc<MockProvider>,
    }

    fn gateway(openai: MockProvider, anthropic: MockProvider, google: MockProvider) -> (Gateway, Mocks) {
        let mocks = Mocks {
            openai: Arc::new(openai),
            anthropic: Arc::new(anthropic),
            google: Arc::new(google),
        };
        let registry = ProviderRegistry::new()
            .with_provider(mocks.openai.clone())
            .with_provider(mocks.anthropic.clone())
            .with_provider(mocks.google.clone());
        (Gateway::from_parts(GatewayConfig::default(), registry), mocks)
    }

    fn default_gateway() -> (Gateway, Mocks) {
        gateway(
            MockProvider::replying(ProviderIdentity::OpenAI, CLASSIFICATION),
            MockProvider::replying(ProviderIdentity::Anthropic, "from anthropic"),
            MockProvider::replying(ProviderIdentity::Google, "Hello!"),
        )
    }

    #[tokio::test]
    async fn test_greeting_completion_uses_default_provider() {
        let (gateway, mocks) = default_gateway();

        let params = CompletionParams {
            intent: Some("greeting".to_string()),
            ..CompletionParams::new(vec![ChatMessage::user("Hi")])
        };
        let result = gateway.complete(params).await.unwrap();

        assert_eq!(result.provider, ProviderIdentity::Google);
        assert_eq!(result.content, "Hello!");
        assert_eq!(mocks.google.call_count(), 1);

        let request = mocks.google.last_request().unwrap();
        assert_eq!(request.temperature, CompletionRequest::DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, CompletionRequest::DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_invalid_preference_falls_through_to_intent_rule() {
        let (gateway, mocks) = default_gateway();

        let params = CompletionParams {
            provider: Some("bogus".to_string()),
            intent: Some("help me write code".to_string()),
            ..CompletionParams::new(vec![ChatMessage::user("fn main")])
        };
        let result = gateway.complete(params).await.unwrap();

        assert_eq!(result.provider, ProviderIdentity::Anthropic);
        assert_eq!(mocks.anthropic.call_count(), 1);
    }

    #[tokio::test]
    async fn test_completion_failure_is_not_retried_elsewhere() {
        let (gateway, mocks) = gateway(
            MockProvider::new(ProviderIdentity::OpenAI),
            MockProvider::new(ProviderIdentity::Anthropic),
            MockProvider::new(ProviderIdentity::Google).then(Err(network_error(ProviderIdentity::Google))),
        );

        let err = gateway
            .complete(CompletionParams::new(vec![ChatMessage::user("Hi")]))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 502);
        assert!(err.retryable());
        assert_eq!(mocks.google.call_count(), 1);
        assert_eq!(mocks.openai.call_count() + mocks.anthropic.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_provider_maps_to_service_unavailable() {
        let google = Arc::new(MockProvider::new(ProviderIdentity::Google));
        let gateway = Gateway::from_parts(
            GatewayConfig::default(),
            ProviderRegistry::new().with_provider(google.clone()),
        );

        let params = CompletionParams {
            provider: Some("openai".to_string()),
            ..CompletionParams::new(vec![ChatMessage::user("Hi")])
        };
        let err = gateway.complete(params).await.unwrap_err();

        assert_eq!(err.error_code(), "E_PROVIDER_DISABLED");
        assert_eq!(err.status_code(), 503);
        assert!(!err.retryable());
        assert_eq!(google.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_call() {
        let (gateway, mocks) = default_gateway();

        let cases = [
            (CompletionParams::default(), ValidationError::EmptyMessages),
            (
                CompletionParams::new(vec![ChatMessage::user("a"), ChatMessage::user("  ")]),
                ValidationError::EmptyMessageContent { index: 1 },
            ),
            (
                CompletionParams {
                    temperature: Some(2.5),
                    ..CompletionParams::new(vec![ChatMessage::user("a")])
                },
                ValidationError::TemperatureOutOfRange(2.5),
            ),
            (
                CompletionParams {
                    max_tokens: Some(0),
                    ..CompletionParams::new(vec![ChatMessage::user("a")])
                },
                ValidationError::InvalidMaxTokens,
            ),
        ];
        for (params, expected) in cases {
            let err = gateway.complete(params).await.unwrap_err();
            assert!(matches!(&err, GatewayError::Validation(v) if *v == expected), "{err}");
            assert_eq!(err.status_code(), 400);
        }

        let err = gateway.classify("   ").await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ValidationError::EmptyText)));

        let long = "é".repeat(10_001);
        let err = gateway.classify(&long).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::TextTooLong { max: 10_000, actual: 10_001 })
        ));
        assert!(gateway.classify(&"é".repeat(10_000)).await.is_ok());

        // Only the last classify reached a provider
        assert_eq!(mocks.openai.call_count(), 1);
        assert_eq!(mocks.anthropic.call_count() + mocks.google.call_count(), 0);
    }

    #[test]
    fn test_nan_temperature_is_rejected() {
        let params = CompletionParams {
            temperature: Some(f32::NAN),
            ..CompletionParams::new(vec![ChatMessage::user("a")])
        };
        assert!(matches!(
            params.validate(),
            Err(ValidationError::TemperatureOutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_respond_routes_by_classified_intent() {
        let (gateway, mocks) = gateway(
            MockProvider::replying(
                ProviderIdentity::OpenAI,
                r#"{"intent":"code_generation","confidence":0.8,"target_model":"gpt-4o"}"#,
            ),
            MockProvider::replying(ProviderIdentity::Anthropic, "fn add(a: i32, b: i32) -> i32"),
            MockProvider::new(ProviderIdentity::Google),
        );

        let routed = gateway.respond("write an add function", None).await.unwrap();

        assert_eq!(routed.intent.intent, "code_generation");
        assert_eq!(routed.intent.source_model, "gpt-4o-mini");
        assert_eq!(routed.completion.provider, ProviderIdentity::Anthropic);
        let request = mocks.anthropic.last_request().unwrap();
        assert_eq!(request.messages, vec![ChatMessage::user("write an add function")]);
        assert_eq!(mocks.google.call_count(), 0);
    }

    #[tokio::test]
    async fn test_respond_stops_when_classification_fails() {
        let (gateway, mocks) = gateway(
            MockProvider::new(ProviderIdentity::OpenAI).then(Err(network_error(ProviderIdentity::OpenAI))),
            MockProvider::new(ProviderIdentity::Anthropic).then(Err(network_error(ProviderIdentity::Anthropic))),
            MockProvider::new(ProviderIdentity::Google),
        );

        let err = gateway.respond("hello", Some("google")).await.unwrap_err();

        assert_eq!(err.status_code(), 503);
        let body = err.to_json();
        assert_eq!(body["error"], "E_ALL_CLASSIFIERS_UNAVAILABLE");
        assert!(body["primary_error"].as_str().unwrap().contains("openai"));
        assert!(body["fallback_error"].as_str().unwrap().contains("anthropic"));
        assert_eq!(mocks.google.call_count(), 0);
    }

    #[tokio::test]
    async fn test_status_reports_providers_and_breaker() {
        let openai = Arc::new(MockProvider::new(ProviderIdentity::OpenAI));
        let gateway = Gateway::from_parts(
            GatewayConfig::default(),
            ProviderRegistry::new().with_provider(openai),
        );
        gateway.router().breaker().force_open().await;

        let status = gateway.status().await;

        let enabled: Vec<_> = status
            .providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.provider)
            .collect();
        assert_eq!(enabled, vec![ProviderIdentity::OpenAI]);
        assert_eq!(status.providers[2].default_model, "gemini-2.0-flash-exp");
        assert_eq!(status.primary_classifier.to_string(), "openai/gpt-4o-mini");
        assert_eq!(status.circuit_breaker.state, CircuitState::Open);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["circuit_breaker"]["state"], "open");
        assert_eq!(json["fallback_classifier"], "anthropic/claude-3-haiku-20240307");
    }

    #[test]
    fn test_config_toml_round_trip_and_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
[classification]
primary = "google/gemini-2.0-flash"

[circuit_breaker]
failure_threshold = 3

[providers.openai]
base_url = "http://localhost:8080/v1"
"#,
        )
        .unwrap();

        let config = GatewayConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.classification.primary.provider, ProviderIdentity::Google);
        assert_eq!(config.classification.fallback.model, "claude-3-haiku-20240307");
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.recovery_timeout_secs, 60);
        assert_eq!(config.http.request_timeout_secs, 120);
        assert!(config.validate().is_ok());

        let saved = temp_dir.path().join("saved.toml");
        config.to_toml_file(&saved).unwrap();
        let reloaded = GatewayConfig::from_toml_file(&saved).unwrap();
        assert_eq!(reloaded.classification, config.classification);
    }

    #[test]
    fn test_config_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            GatewayConfig::from_toml_file(temp_dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));

        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[classification]\nprimary = \"unknown-model\"\n").unwrap();
        assert!(matches!(
            GatewayConfig::from_toml_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.http.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.providers.google.base_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(m)) if m.contains("google")));
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let mut config = GatewayConfig::default();
        config.providers.openai.api_key = Some("sk-secret".to_string());

        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains(REDACTED));
        assert_eq!(config.redacted().providers.anthropic.api_key, None);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let vars = [
            (env::credentials::ANTHROPIC_API_KEY, "sk-ant-env"),
            (env::overrides::PRIMARY_MODEL, "gemini-2.0-flash"),
            (env::overrides::FALLBACK_MODEL, "openai/gpt-4o-mini"),
            (env::overrides::BREAKER_THRESHOLD, "7"),
            (env::overrides::BREAKER_TIMEOUT, "15"),
        ];
        for (name, value) in vars {
            unsafe { std::env::set_var(name, value) };
        }

        let mut config = GatewayConfig::default();
        let result = config.apply_env_overrides();

        for (name, _) in vars {
            unsafe { std::env::remove_var(name) };
        }
        result.unwrap();

        assert_eq!(config.providers.anthropic.api_key.as_deref(), Some("sk-ant-env"));
        assert_eq!(config.classification.primary.provider, ProviderIdentity::Google);
        assert_eq!(config.classification.fallback.to_string(), "openai/gpt-4o-mini");
        assert_eq!(config.circuit_breaker.failure_threshold, 7);
        assert_eq!(config.circuit_breaker.recovery_timeout_secs, 15);
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_names_the_variable() {
        unsafe { std::env::set_var(env::overrides::BREAKER_THRESHOLD, "many") };
        let result = GatewayConfig::default().apply_env_overrides();
        unsafe { std::env::remove_var(env::overrides::BREAKER_THRESHOLD) };

        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride { var, .. }) if var == env::overrides::BREAKER_THRESHOLD
        ));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = GatewayConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        assert!(Gateway::new(config).is_err());
    }
}
