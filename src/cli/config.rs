//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Explicit `--config` path
//! 2. Current directory: ./intent-gateway.toml or ./.intent-gateway/config.toml
//! 3. User config: ~/.intent-gateway/config.toml
//! 4. System config: /etc/intent-gateway/config.toml
//! 5. Built-in defaults
//!
//! Environment overrides are applied on top of whichever source was used.

use crate::{env, gateway::GatewayConfig};
use anyhow::{Context, Result};
use std::env as std_env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load the effective configuration: file (explicit or discovered), then
    /// environment overrides, then validation.
    pub fn load(config_override: Option<&Path>) -> Result<GatewayConfig> {
        let mut config = match config_override {
            Some(path) => {
                info!("Loading configuration override from: {:?}", path);
                GatewayConfig::from_toml_file(path)?
            }
            None => Self::discover_config()?,
        };

        config
            .apply_env_overrides()
            .context("applying environment overrides")?;
        config.validate()?;
        Ok(config)
    }

    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<GatewayConfig> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return Ok(GatewayConfig::from_toml_file(config_path)?);
        }

        info!("No configuration file found, using defaults");
        Ok(GatewayConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::get_config_candidates())
    }

    fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    pub fn get_config_candidates() -> Vec<PathBuf> {
        let current_dir = std_env::current_dir().ok();
        Self::candidates_for(current_dir.as_deref(), Self::get_home_dir().as_deref())
    }

    fn candidates_for(current_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(current_dir));
        }

        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/intent-gateway").join(env::CONFIG_FILE_NAME));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("intent-gateway")
                    .join(env::CONFIG_FILE_NAME),
            );
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information and the effective configuration
    pub fn show_discovery_info(config_override: Option<&Path>) -> Result<()> {
        println!("Configuration Discovery Hierarchy:");
        println!();

        if let Some(path) = config_override {
            let status = if path.is_file() { "✓ EXISTS" } else { "✗ NOT FOUND" };
            println!("  0. {:?} (--config) - {}", path, status);
        }

        let candidates = Self::get_config_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match config_override
            .map(Path::to_path_buf)
            .or_else(Self::find_config_file)
        {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }

        let config = Self::load(config_override)?;
        println!();
        println!("Effective configuration (credentials redacted):");
        println!();
        print!("{}", toml::to_string_pretty(&config.redacted())?);

        Ok(())
    }
}
