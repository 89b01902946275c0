use crate::llm::provider::{LLMProvider, LLMProviderFactory};
use crate::llm::types::{HttpConfig, LLMError, ProviderIdentity, ProvidersConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The adapters usable at runtime, keyed by provider.
///
/// Built once at startup and read-only afterwards, so it can be shared across
/// concurrent requests without locking.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderIdentity, Arc<dyn LLMProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialise every provider that has a credential.
    ///
    /// Never fails as a whole: a missing credential or a client that cannot be
    /// built disables only that provider.
    pub fn from_config(providers: &ProvidersConfig, http: &HttpConfig) -> Self {
        let mut registry = Self::new();

        for identity in ProviderIdentity::ALL {
            match LLMProviderFactory::create_provider(identity, providers.get(identity), http) {
                Ok(provider) => {
                    info!(
                        provider = %identity,
                        default_model = provider.default_model(),
                        "provider client initialized"
                    );
                    registry.providers.insert(identity, provider);
                }
                Err(LLMError::ProviderDisabled { .. }) => {
                    warn!(
                        provider = %identity,
                        "{} not set - provider disabled",
                        identity.credential_var()
                    );
                }
                Err(e) => {
                    error!(provider = %identity, error = %e, "provider client failed to initialize - provider disabled");
                }
            }
        }

        registry
    }

    /// Register an adapter under its own identity, replacing any previous one
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.providers.insert(provider.identity(), provider);
        self
    }

    pub fn get(&self, provider: ProviderIdentity) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(&provider).cloned()
    }

    /// Active adapter, or [`LLMError::ProviderDisabled`]
    pub fn lookup(&self, provider: ProviderIdentity) -> Result<Arc<dyn LLMProvider>, LLMError> {
        self.get(provider)
            .ok_or(LLMError::ProviderDisabled { provider })
    }

    pub fn is_enabled(&self, provider: ProviderIdentity) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Enabled providers in declaration order
    pub fn enabled(&self) -> Vec<ProviderIdentity> {
        ProviderIdentity::ALL
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("enabled", &self.enabled())
            .finish()
    }
}
