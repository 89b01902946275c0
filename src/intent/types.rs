use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::{LLMError, ProviderIdentity};

/// Labels a classifier may answer with
pub const INTENT_LABELS: [&str; 6] = ["greeting", "question", "command", "feedback", "help", "other"];

/// Reply shape a classifier model must produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: String,
    pub confidence: f64,
    pub target_model: String,
}

impl IntentClassification {
    pub fn into_result(self, source_model: impl Into<String>) -> IntentResult {
        IntentResult {
            intent: self.intent,
            confidence: self.confidence,
            target_model: self.target_model,
            source_model: source_model.into(),
        }
    }
}

/// Classification outcome, stamped with the classifier that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f64,
    pub target_model: String,
    pub source_model: String,
}

/// A classifier model reference written as `provider/model`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassifierModel {
    pub provider: ProviderIdentity,
    pub model: String,
}

impl ClassifierModel {
    pub fn new(provider: ProviderIdentity, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid classifier model '{0}' (expected provider/model or a known model name)")]
pub struct InvalidClassifierModel(pub String);

impl FromStr for ClassifierModel {
    type Err = InvalidClassifierModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidClassifierModel(s.to_string());
        let s = s.trim();

        match s.split_once('/') {
            Some((provider, model)) => {
                let provider = provider.parse::<ProviderIdentity>().map_err(|_| invalid())?;
                let model = model.trim();
                if model.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::new(provider, model))
            }
            None => {
                let provider = ProviderIdentity::infer_from_model(s).ok_or_else(invalid)?;
                Ok(Self::new(provider, s))
            }
        }
    }
}

impl TryFrom<String> for ClassifierModel {
    type Error = InvalidClassifierModel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassifierModel> for String {
    fn from(value: ClassifierModel) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClassifierModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Guarded by the circuit breaker
    pub primary: ClassifierModel,
    /// Last resort, never guarded
    pub fallback: ClassifierModel,
    pub max_tokens: u32,
    /// Longest accepted input, counted in characters
    pub max_text_chars: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            primary: ClassifierModel::new(ProviderIdentity::OpenAI, "gpt-4o-mini"),
            fallback: ClassifierModel::new(ProviderIdentity::Anthropic, "claude-3-haiku-20240307"),
            max_tokens: 100,
            max_text_chars: 10_000,
        }
    }
}

/// Failure of a single classifier attempt
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The breaker rejected the call; nothing was sent upstream
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error(transparent)]
    Upstream(#[from] LLMError),
    #[error("malformed classification reply: {0}")]
    MalformedReply(String),
}

impl ClassifierError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CircuitOpen => "E_CIRCUIT_OPEN",
            Self::Upstream(err) => err.error_code(),
            Self::MalformedReply(_) => "E_MALFORMED_CLASSIFICATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    #[error("all intent classification models unavailable")]
    AllProvidersUnavailable {
        primary_error: String,
        fallback_error: String,
    },
}

impl IntentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AllProvidersUnavailable { .. } => "E_ALL_CLASSIFIERS_UNAVAILABLE",
        }
    }

    pub fn retryable(&self) -> bool {
        true
    }
}
