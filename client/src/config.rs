//! Configuration management for the Trackwell client
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: TW__)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use trackwell_shared::decode::NegativeValuePolicy;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Remote record store endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the record store API, e.g. `https://example.com/api`
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Engine behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// What to do with negative wire values (see the decode module)
    pub negative_values: NegativeValuePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negative_values: NegativeValuePolicy::Allow,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                timeout_secs: 30,
            },
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with TW__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (TW__ prefix)
            // e.g., TW__API__BASE_URL=https://example.com/api sets api.base_url
            .add_source(config::Environment::with_prefix("TW").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
