use futures::future::BoxFuture;
use tracing::debug;

use crate::intent::types::{
    ClassifierError, ClassifierModel, INTENT_LABELS, IntentClassification,
};
use crate::llm::{ChatMessage, CompletionRequest, Dispatcher};

/// One model able to label a piece of text
pub trait IntentClassifier: Send + Sync {
    /// Identifier reported as `source_model`
    fn model_id(&self) -> &str;

    fn classify<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<IntentClassification, ClassifierError>>;
}

/// Classifier backed by a chat model reached through the dispatcher
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    dispatcher: Dispatcher,
    model: ClassifierModel,
    max_tokens: u32,
}

impl ModelClassifier {
    pub fn new(dispatcher: Dispatcher, model: ClassifierModel, max_tokens: u32) -> Self {
        Self {
            dispatcher,
            model,
            max_tokens,
        }
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    fn request(&self, text: &str) -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system(system_prompt(self.model.provider.default_model())),
            ChatMessage::user(text),
        ])
        .with_model(self.model.model.clone())
        .with_temperature(0.0)
        .with_max_tokens(self.max_tokens)
    }
}

impl IntentClassifier for ModelClassifier {
    fn model_id(&self) -> &str {
        &self.model.model
    }

    fn classify<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<IntentClassification, ClassifierError>> {
        Box::pin(async move {
            let request = self.request(text);
            let result = self
                .dispatcher
                .dispatch(self.model.provider, request)
                .await?;
            debug!(model = %self.model, request_id = %result.request_id, "classification reply received");
            parse_reply(&result.content)
        })
    }
}

/// Fixed instruction; `example_target` shows the expected `target_model` shape
pub fn system_prompt(example_target: &str) -> String {
    format!(
        "You are an intent classifier. Analyze the user's message and classify it into ONE of these intents: {}. \
         Respond with ONLY a JSON object in this exact format: \
         {{\"intent\": \"category\", \"confidence\": 0.95, \"target_model\": \"{example_target}\"}}",
        INTENT_LABELS.join(", ")
    )
}

/// Parse a reply that must be exactly one JSON object.
///
/// Surrounding whitespace is allowed. Anything else, including markdown code
/// fences, is malformed.
pub fn parse_reply(content: &str) -> Result<IntentClassification, ClassifierError> {
    let malformed = |e: serde_json::Error| ClassifierError::MalformedReply(e.to_string());

    let value: serde_json::Value = serde_json::from_str(content.trim()).map_err(malformed)?;
    if !value.is_object() {
        return Err(ClassifierError::MalformedReply(
            "expected a JSON object".to_string(),
        ));
    }
    let classification: IntentClassification = serde_json::from_value(value).map_err(malformed)?;

    if classification.intent.trim().is_empty() {
        return Err(ClassifierError::MalformedReply("empty intent".to_string()));
    }
    if !classification.confidence.is_finite() {
        return Err(ClassifierError::MalformedReply(
            "confidence is not a number".to_string(),
        ));
    }

    Ok(classification)
}
