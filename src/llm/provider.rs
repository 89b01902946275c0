use crate::llm::types::{
    CompletionRequest, CompletionResult, HttpConfig, LLMError, ProviderIdentity, ProviderSettings,
};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Provider adapter: one upstream call per request, normalized result.
///
/// Implementations do not retry. Failover is the caller's concern.
pub trait LLMProvider: Send + Sync {
    /// Execute a single completion request
    ///
    /// The request must contain at least one message. When `request.model`
    /// is unset the adapter substitutes [`LLMProvider::default_model`].
    fn complete(&self, request: CompletionRequest)
    -> BoxFuture<'_, Result<CompletionResult, LLMError>>;

    /// Which provider this adapter talks to
    fn identity(&self) -> ProviderIdentity;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;
}

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Build the adapter for `provider`.
    ///
    /// Fails with [`LLMError::ProviderDisabled`] when no credential is set.
    pub fn create_provider(
        provider: ProviderIdentity,
        settings: &ProviderSettings,
        http: &HttpConfig,
    ) -> Result<Arc<dyn LLMProvider>, LLMError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LLMError::ProviderDisabled { provider })?;

        match provider {
            ProviderIdentity::OpenAI => Ok(Arc::new(
                crate::llm::openai_provider::OpenAIProvider::new(api_key, settings, http)?,
            )),
            ProviderIdentity::Anthropic => Ok(Arc::new(
                crate::llm::anthropic_provider::AnthropicProvider::new(api_key, settings, http)?,
            )),
            ProviderIdentity::Google => Ok(Arc::new(
                crate::llm::google_provider::GoogleProvider::new(api_key, settings, http)?,
            )),
        }
    }
}
