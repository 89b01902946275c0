//! OpenAI Chat Completions adapter.
//!
//! Thin HTTP wrapper for `POST {base}/chat/completions`. Conversation turns are
//! forwarded in caller order, system turns included. Response parsing lives in
//! [`parse_response`] so it can be tested without a server.

use crate::llm::http::{self, ExtraParams};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    ChatMessage, CompletionRequest, CompletionResult, HttpConfig, LLMError, ProviderIdentity,
    ProviderSettings, TokenUsage,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_TEMPERATURE: f32 = 2.0;
const RESERVED_PARAMS: &[&str] = &["model", "messages", "temperature", "max_tokens"];

pub struct OpenAIProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        settings: &ProviderSettings,
        http: &HttpConfig,
    ) -> Result<Self, LLMError> {
        Ok(Self {
            http: http::build_client(http)?,
            api_key,
            base_url: http::base_url(settings.base_url.as_deref(), DEFAULT_BASE_URL),
            default_model: settings
                .default_model
                .clone()
                .unwrap_or_else(|| ProviderIdentity::OpenAI.default_model().to_string()),
        })
    }

    async fn execute(&self, request: CompletionRequest) -> Result<CompletionResult, LLMError> {
        http::check_request(&request)?;

        let model = request.model_or(&self.default_model).to_string();
        let body = ApiRequest {
            model: &model,
            messages: &request.messages,
            temperature: request.temperature.clamp(0.0, MAX_TEMPERATURE),
            max_tokens: request.max_tokens,
            extra: ExtraParams::new(&request.extra, RESERVED_PARAMS),
        };

        info!(request_id = %request.request_id, %model, "calling OpenAI");
        let started = Instant::now();
        let response: ApiResponse = http::post_json(
            ProviderIdentity::OpenAI,
            self.http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key),
            &body,
        )
        .await?;

        let mut result = parse_response(response, &model)?;
        result.request_id = request.request_id;
        result.latency = started.elapsed();
        Ok(result)
    }
}

impl LLMProvider for OpenAIProvider {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'_, Result<CompletionResult, LLMError>> {
        Box::pin(self.execute(request))
    }

    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAI
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(flatten)]
    extra: ExtraParams<'a>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(api: ApiResponse, requested_model: &str) -> Result<CompletionResult, LLMError> {
    let content = api
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
        .ok_or(LLMError::EmptyCompletion {
            provider: ProviderIdentity::OpenAI,
        })?;

    let token_usage = api
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(CompletionResult {
        request_id: uuid::Uuid::nil(),
        content,
        model: api.model.unwrap_or_else(|| requested_model.to_string()),
        provider: ProviderIdentity::OpenAI,
        token_usage,
        latency: std::time::Duration::ZERO,
    })
}
