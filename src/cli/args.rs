//! Command line argument parsing
//!
//! Subcommands:
//! - `classify`: Classify the intent of a text
//! - `complete`: Run one completion on a selected provider
//! - `route`: Classify a text, then answer it on the provider its intent selects
//! - `status`: Show enabled providers, classifiers and circuit breaker state
//! - `show-config`: Show configuration discovery information

use crate::gateway::CompletionParams;
use crate::llm::ChatMessage;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Classify(String),
    Complete(CompletionParams),
    Route {
        text: String,
        provider: Option<String>,
    },
    Status,
    ShowConfig,
}

#[derive(Debug, Parser)]
#[command(name = "intent-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Intent classification and multi-provider LLM completion gateway with circuit-breaker failover"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify the intent of a text
    Classify {
        /// Text to classify
        text: String,
    },
    /// Run one completion on a selected provider
    Complete {
        /// User message
        message: String,
        /// System instruction sent before the message
        #[arg(long = "system")]
        system: Option<String>,
        /// Preferred provider (openai, anthropic, google)
        #[arg(short = 'p', long = "provider")]
        provider: Option<String>,
        /// Intent label used when no provider is given
        #[arg(short = 'i', long = "intent")]
        intent: Option<String>,
        /// Model override
        #[arg(short = 'm', long = "model")]
        model: Option<String>,
        /// Sampling temperature (0.0 - 2.0)
        #[arg(short = 't', long = "temperature")]
        temperature: Option<f32>,
        /// Completion token limit
        #[arg(long = "max-tokens")]
        max_tokens: Option<u32>,
    },
    /// Classify a text, then answer it on the provider its intent selects
    Route {
        /// Text to classify and answer
        text: String,
        /// Preferred provider, overrides intent-based selection
        #[arg(short = 'p', long = "provider")]
        provider: Option<String>,
    },
    /// Show enabled providers, classifiers and circuit breaker state
    Status,
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Classify { text }) => Ok(ExecutionMode::Classify(text.clone())),
            Some(Commands::Complete {
                message,
                system,
                provider,
                intent,
                model,
                temperature,
                max_tokens,
            }) => {
                let mut messages = Vec::new();
                if let Some(system) = system {
                    messages.push(ChatMessage::system(system.clone()));
                }
                messages.push(ChatMessage::user(message.clone()));

                Ok(ExecutionMode::Complete(CompletionParams {
                    provider: provider.clone(),
                    intent: intent.clone(),
                    messages,
                    model: model.clone(),
                    temperature: *temperature,
                    max_tokens: *max_tokens,
                }))
            }
            Some(Commands::Route { text, provider }) => Ok(ExecutionMode::Route {
                text: text.clone(),
                provider: provider.clone(),
            }),
            Some(Commands::Status) => Ok(ExecutionMode::Status),
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            None => Err(
                "No command specified. Use 'intent-gateway --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}
