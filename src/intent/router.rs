use std::sync::Arc;
use tracing::{error, info, warn};

use crate::intent::classifier::IntentClassifier;
use crate::intent::types::{ClassifierError, IntentError, IntentResult};
use crate::resilience::{CallError, CircuitBreaker};

/// Classification with failover.
///
/// The primary classifier runs under the circuit breaker. Any primary failure,
/// a breaker rejection included, falls through to the fallback classifier,
/// which is deliberately unguarded as the last resort.
#[derive(Clone)]
pub struct IntentRouter {
    primary: Arc<dyn IntentClassifier>,
    fallback: Arc<dyn IntentClassifier>,
    breaker: Arc<CircuitBreaker>,
}

impl IntentRouter {
    pub fn new(
        primary: Arc<dyn IntentClassifier>,
        fallback: Arc<dyn IntentClassifier>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            primary,
            fallback,
            breaker,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn primary_model(&self) -> &str {
        self.primary.model_id()
    }

    pub fn fallback_model(&self) -> &str {
        self.fallback.model_id()
    }

    pub async fn classify(&self, text: &str) -> Result<IntentResult, IntentError> {
        let primary_error = match self.breaker.call(|| self.primary.classify(text)).await {
            Ok(classification) => {
                info!(model = self.primary_model(), intent = %classification.intent, "intent classified");
                return Ok(classification.into_result(self.primary_model()));
            }
            Err(CallError::CircuitOpen) => ClassifierError::CircuitOpen,
            Err(CallError::Failed(err)) => err,
        };

        warn!(
            primary = self.primary_model(),
            fallback = self.fallback_model(),
            code = primary_error.error_code(),
            error = %primary_error,
            "primary classifier failed, using fallback"
        );

        match self.fallback.classify(text).await {
            Ok(classification) => {
                info!(model = self.fallback_model(), intent = %classification.intent, "intent classified by fallback");
                Ok(classification.into_result(self.fallback_model()))
            }
            Err(fallback_error) => {
                error!(
                    primary_error = %primary_error,
                    fallback_error = %fallback_error,
                    "all intent classifiers failed"
                );
                Err(IntentError::AllProvidersUnavailable {
                    primary_error: format!("{}: {primary_error}", self.primary_model()),
                    fallback_error: format!("{}: {fallback_error}", self.fallback_model()),
                })
            }
        }
    }
}

impl std::fmt::Debug for IntentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRouter")
            .field("primary", &self.primary_model())
            .field("fallback", &self.fallback_model())
            .field("breaker", &self.breaker)
            .finish()
    }
}
