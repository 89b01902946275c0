//! Google Gemini `generateContent` adapter.
//!
//! Gemini names the assistant role `model` and takes the system prompt as a
//! separate `systemInstruction`. Sampling parameters, including any extra
//! request parameters, go into `generationConfig`.

use crate::llm::http::{self, ExtraParams};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    CompletionRequest, CompletionResult, HttpConfig, LLMError, MessageRole, ProviderIdentity,
    ProviderSettings, TokenUsage,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_TEMPERATURE: f32 = 2.0;
/// `generationConfig` fields set from the normalized request
const RESERVED_PARAMS: &[&str] = &["temperature", "maxOutputTokens"];

pub struct GoogleProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GoogleProvider {
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
                .unwrap_or_else(|| ProviderIdentity::Google.default_model().to_string()),
        })
    }

    async fn execute(&self, request: CompletionRequest) -> Result<CompletionResult, LLMError> {
        http::check_request(&request)?;

        let model = request.model_or(&self.default_model).to_string();
        let body = build_request(&request);

        info!(request_id = %request.request_id, %model, "calling Google Gemini");
        let started = Instant::now();
        let response: ApiResponse = http::post_json(
            ProviderIdentity::Google,
            self.http
                .post(generate_content_url(&self.base_url, &model)?)
                .header("x-goog-api-key", &self.api_key),
            &body,
        )
        .await?;

        let mut result = parse_response(response, &model)?;
        result.request_id = request.request_id;
        result.latency = started.elapsed();
        Ok(result)
    }
}

impl LLMProvider for GoogleProvider {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'_, Result<CompletionResult, LLMError>> {
        Box::pin(self.execute(request))
    }

    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Google
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// `{base}/models/{model}:generateContent`, with the model escaped as a
/// single path segment.
fn generate_content_url(base_url: &str, model: &str) -> Result<url::Url, LLMError> {
    let mut url = url::Url::parse(base_url)
        .map_err(|e| LLMError::InvalidRequest(format!("invalid Google base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| LLMError::InvalidRequest(format!("Google base URL cannot be a base: {base_url}")))?
        .pop_if_empty()
        .push("models")
        .push(&format!("{model}:generateContent"));
    Ok(url)
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<OwnedPart>,
}

#[derive(Serialize)]
struct OwnedPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(flatten)]
    extra: ExtraParams<'a>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

fn build_request(request: &CompletionRequest) -> ApiRequest<'_> {
    let contents = request
        .conversation()
        .map(|m| Content {
            role: match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            },
            parts: vec![RequestPart { text: &m.content }],
        })
        .collect();

    ApiRequest {
        contents,
        system_instruction: request.system_prompt().map(|text| SystemInstruction {
            parts: vec![OwnedPart { text }],
        }),
        generation_config: GenerationConfig {
            temperature: request.temperature.clamp(0.0, MAX_TEMPERATURE),
            max_output_tokens: request.max_tokens,
            extra: ExtraParams::new(&request.extra, RESERVED_PARAMS),
        },
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response(api: ApiResponse, requested_model: &str) -> Result<CompletionResult, LLMError> {
    let content: String = api
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(LLMError::EmptyCompletion {
            provider: ProviderIdentity::Google,
        });
    }

    let token_usage = api
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    Ok(CompletionResult {
        request_id: uuid::Uuid::nil(),
        content,
        model: api
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        provider: ProviderIdentity::Google,
        token_usage,
        latency: std::time::Duration::ZERO,
    })
}
