//! Mock adapters shared by unit tests across the crate.

use super::provider::LLMProvider;
use super::types::{CompletionRequest, CompletionResult, LLMError, ProviderIdentity, TokenUsage};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Adapter that replays scripted replies and records every request.
///
/// When the script runs out it answers with `fallback_reply`.
pub struct MockProvider {
    identity: ProviderIdentity,
    script: Mutex<VecDeque<Result<String, LLMError>>>,
    fallback_reply: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(identity: ProviderIdentity) -> Self {
        Self {
            identity,
            script: Mutex::new(VecDeque::new()),
            fallback_reply: format!("reply from {identity}"),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(identity: ProviderIdentity, reply: impl Into<String>) -> Self {
        Self {
            fallback_reply: reply.into(),
            ..Self::new(identity)
        }
    }

    pub fn then(self, outcome: Result<String, LLMError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl LLMProvider for MockProvider {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'_, Result<CompletionResult, LLMError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback_reply.clone()));
        let identity = self.identity;
        let model = request.model_or(identity.default_model()).to_string();

        Box::pin(async move {
            let content = outcome?;
            Ok(CompletionResult {
                request_id: request.request_id,
                content,
                model,
                provider: identity,
                token_usage: TokenUsage::new(10, 5),
                latency: Duration::from_millis(1),
            })
        })
    }

    fn identity(&self) -> ProviderIdentity {
        self.identity
    }

    fn default_model(&self) -> &str {
        self.identity.default_model()
    }
}

pub fn network_error(provider: ProviderIdentity) -> LLMError {
    LLMError::Network {
        provider,
        message: "connection refused".to_string(),
    }
}
