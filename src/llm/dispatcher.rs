use crate::llm::registry::ProviderRegistry;
use crate::llm::types::{CompletionRequest, CompletionResult, LLMError, ProviderIdentity};
use std::sync::Arc;
use tracing::{debug, warn};

/// Single entry point for "route one request": registry lookup, then invoke.
///
/// Adapter failures are returned unchanged; nothing is retried and no other
/// provider is substituted.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn dispatch(
        &self,
        provider: ProviderIdentity,
        request: CompletionRequest,
    ) -> Result<CompletionResult, LLMError> {
        let adapter = self.registry.lookup(provider).inspect_err(|_| {
            warn!(%provider, request_id = %request.request_id, "dispatch to disabled provider");
        })?;

        debug!(%provider, request_id = %request.request_id, "dispatching request");
        adapter.complete(request).await
    }
}
