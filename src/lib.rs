//! # Intent Gateway
//!
//! Intent classification and completion routing across several hosted LLM
//! providers.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: Provider adapters (OpenAI, Anthropic, Google), the provider
//!   registry, the selection policy and the dispatcher
//! - **[`resilience`]**: Circuit breaker guarding the primary classifier
//! - **[`intent`]**: Classifiers and the primary/fallback intent router
//! - **[`gateway`]**: Configuration, input validation and the public entry points
//!
//! Providers without a credential are disabled at startup; the rest of the
//! gateway keeps working. Completions never fail over to another provider.
//! Classification does: a failing or circuit-broken primary model falls back
//! to a second model, and only when both fail is the request rejected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use intent_gateway::{Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = GatewayConfig::default();
//!     config.apply_env_overrides()?;
//!     let gateway = Gateway::new(config)?;
//!
//!     let routed = gateway.respond("Write a haiku about rust", None).await?;
//!     println!("{} -> {}", routed.intent.intent, routed.completion.content);
//!     Ok(())
//! }
//! ```

/// Provider-agnostic LLM interface.
///
/// Adapters for each supported provider behind one trait, plus the registry,
/// selection policy and dispatcher that route a request to one of them.
pub mod llm;

/// Failure isolation for upstream calls.
pub mod resilience;

/// Intent classification with failover.
pub mod intent;

/// Gateway configuration and entry points.
pub mod gateway;

/// Environment constants and path utilities.
///
/// Centralizes environment variable names, configuration file names and
/// directory names used throughout the application.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use gateway::{
    CompletionParams, ConfigError, Gateway, GatewayConfig, GatewayError, GatewayStatus,
    RoutedResponse, ValidationError,
};
pub use intent::{IntentError, IntentResult, IntentRouter};
pub use llm::{
    ChatMessage, CompletionRequest, CompletionResult, LLMError, LLMProvider, ProviderIdentity,
    ProviderRegistry,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
