//! Anthropic Messages API adapter.
//!
//! Thin HTTP wrapper for `POST {base}/messages`. The Messages API takes the
//! system prompt as a top-level field, so system turns are folded into it and
//! only user/assistant turns are sent as messages.

use crate::llm::http::{self, ExtraParams};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    CompletionRequest, CompletionResult, HttpConfig, LLMError, ProviderIdentity,
    ProviderSettings, TokenUsage,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_TEMPERATURE: f32 = 1.0;
const RESERVED_PARAMS: &[&str] = &["model", "max_tokens", "temperature", "system", "messages"];

pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
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
                .unwrap_or_else(|| ProviderIdentity::Anthropic.default_model().to_string()),
        })
    }

    async fn execute(&self, request: CompletionRequest) -> Result<CompletionResult, LLMError> {
        http::check_request(&request)?;

        let model = request.model_or(&self.default_model).to_string();
        let system = request.system_prompt();
        let messages: Vec<ApiMessage<'_>> = request
            .conversation()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        let body = ApiRequest {
            model: &model,
            max_tokens: request.max_tokens,
            temperature: request.temperature.clamp(0.0, MAX_TEMPERATURE),
            system: system.as_deref(),
            messages: &messages,
            extra: ExtraParams::new(&request.extra, RESERVED_PARAMS),
        };

        info!(request_id = %request.request_id, %model, "calling Anthropic");
        let started = Instant::now();
        let response: ApiResponse = http::post_json(
            ProviderIdentity::Anthropic,
            self.http
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION),
            &body,
        )
        .await?;

        let mut result = parse_response(response, &model)?;
        result.request_id = request.request_id;
        result.latency = started.elapsed();
        Ok(result)
    }
}

impl LLMProvider for AnthropicProvider {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'_, Result<CompletionResult, LLMError>> {
        Box::pin(self.execute(request))
    }

    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Anthropic
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
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ApiMessage<'a>],
    #[serde(flatten)]
    extra: ExtraParams<'a>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(api: ApiResponse, requested_model: &str) -> Result<CompletionResult, LLMError> {
    let content: String = api
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Unknown => None,
        })
        .collect();

    if content.is_empty() {
        return Err(LLMError::EmptyCompletion {
            provider: ProviderIdentity::Anthropic,
        });
    }

    // The Messages API never reports a total; it is derived here.
    let token_usage = api
        .usage
        .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    Ok(CompletionResult {
        request_id: uuid::Uuid::nil(),
        content,
        model: api.model.unwrap_or_else(|| requested_model.to_string()),
        provider: ProviderIdentity::Anthropic,
        token_usage,
        latency: std::time::Duration::ZERO,
    })
}
