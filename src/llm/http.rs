//! Shared HTTP plumbing for the provider adapters.
//!
//! Each adapter owns its own [`reqwest::Client`] built with the configured
//! timeouts. [`post_json`] performs the single outbound call and classifies
//! transport, timeout and status failures into [`LLMError`].

use crate::llm::types::{CompletionRequest, HttpConfig, LLMError, ProviderIdentity};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::{debug, error, warn};

pub(crate) fn build_client(http: &HttpConfig) -> Result<reqwest::Client, LLMError> {
    reqwest::Client::builder()
        .timeout(http.request_timeout())
        .connect_timeout(http.connect_timeout())
        .build()
        .map_err(|e| LLMError::HttpClientBuild(e.to_string()))
}

/// Resolve the endpoint root, trimming any trailing slash.
pub(crate) fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Reject requests an adapter must never send upstream.
pub(crate) fn check_request(request: &CompletionRequest) -> Result<(), LLMError> {
    if request.messages.is_empty() {
        return Err(LLMError::InvalidRequest(
            "at least one message is required".to_string(),
        ));
    }
    if request.conversation().next().is_none() {
        return Err(LLMError::InvalidRequest(
            "at least one user or assistant message is required".to_string(),
        ));
    }
    Ok(())
}

/// Caller-supplied request parameters, flattened into an adapter's wire body.
///
/// Keys the adapter already sets from the normalized request are skipped so
/// the body never carries duplicate fields.
pub(crate) struct ExtraParams<'a> {
    params: &'a serde_json::Map<String, serde_json::Value>,
    reserved: &'static [&'static str],
}

impl<'a> ExtraParams<'a> {
    pub(crate) fn new(
        params: &'a serde_json::Map<String, serde_json::Value>,
        reserved: &'static [&'static str],
    ) -> Self {
        let extra = Self { params, reserved };
        for key in params.keys().filter(|key| extra.is_reserved(key)) {
            warn!(%key, "ignoring extra request parameter that shadows a normalized field");
        }
        extra
    }

    fn is_reserved(&self, key: &str) -> bool {
        self.reserved.contains(&key)
    }
}

impl Serialize for ExtraParams<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.params.iter().filter(|(key, _)| !self.is_reserved(key)))
    }
}

pub(crate) async fn post_json<T: DeserializeOwned>(
    provider: ProviderIdentity,
    request: reqwest::RequestBuilder,
    body: &impl Serialize,
) -> Result<T, LLMError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;

    if !(200..300).contains(&status) {
        error!(%provider, status, "upstream API returned an error status");
        debug!(%provider, body = %text, "upstream error body");
        return Err(LLMError::ApiResponse {
            provider,
            status,
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| LLMError::ApiParse {
        provider,
        message: e.to_string(),
    })
}

fn transport_error(provider: ProviderIdentity, err: reqwest::Error) -> LLMError {
    if err.is_timeout() {
        error!(%provider, "upstream request timed out");
        LLMError::Timeout { provider }
    } else {
        error!(%provider, error = %err, "upstream request failed");
        LLMError::Network {
            provider,
            message: err.without_url().to_string(),
        }
    }
}
