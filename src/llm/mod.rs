pub mod anthropic_provider;
pub mod dispatcher;
pub mod google_provider;
mod http;
pub mod openai_provider;
pub mod provider;
pub mod registry;
pub mod selection;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use anthropic_provider::AnthropicProvider;
pub use dispatcher::Dispatcher;
pub use google_provider::GoogleProvider;
pub use openai_provider::OpenAIProvider;
pub use provider::{LLMProvider, LLMProviderFactory};
pub use registry::ProviderRegistry;
pub use selection::{DEFAULT_PROVIDER, select_provider};
pub use types::*;
