//! Environment constants and path utilities for the intent gateway.
//!
//! This module centralizes environment variable names, configuration file
//! names and the directories searched for configuration.

/// Main application directory name (hidden directory like .git, .vscode)
pub const GATEWAY_DIR_NAME: &str = ".intent-gateway";

/// Configuration file name inside [`GATEWAY_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "intent-gateway.toml";

/// Default `RUST_LOG` directive used by the binary
pub const DEFAULT_LOG_FILTER: &str = "intent_gateway=info";

/// Provider credential variables. Presence enables the provider.
pub mod credentials {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
}

/// Classification and circuit breaker overrides
pub mod overrides {
    /// Primary classifier, `provider/model` or a bare model name
    pub const PRIMARY_MODEL: &str = "INTENT_ROUTER_PRIMARY_MODEL";

    /// Fallback classifier, `provider/model` or a bare model name
    pub const FALLBACK_MODEL: &str = "INTENT_ROUTER_FALLBACK_MODEL";

    /// Consecutive failures before the breaker opens
    pub const BREAKER_THRESHOLD: &str = "CIRCUIT_BREAKER_FAILURE_THRESHOLD";

    /// Seconds the breaker stays open before a trial call
    pub const BREAKER_TIMEOUT: &str = "CIRCUIT_BREAKER_TIMEOUT";
}

/// Common path utilities
use std::path::{Path, PathBuf};

/// Build the gateway directory path under a base directory
pub fn gateway_dir_path(base: &Path) -> PathBuf {
    base.join(GATEWAY_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    gateway_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build hidden-directory config file path in the current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    gateway_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Read a non-empty environment variable. Blank values count as unset.
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
