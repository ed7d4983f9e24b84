//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub game: GameConfig,
    pub price: PriceConfig,
    pub analyst: AnalystConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Display name of the traded asset, e.g. "BTC-USD".
    pub asset: String,
    /// Round duration D: wagering stays open for D, resolution follows
    /// another D after lock. Production cadence is 15 minutes; demo
    /// deployments shorten this.
    pub round_duration_secs: u64,
    /// Price refresh / lifecycle tick interval.
    pub tick_interval_secs: u64,
    /// Bounded price history length fed to the chart and the analyst.
    pub history_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriceConfig {
    /// Hard deadline per upstream source request, in milliseconds.
    pub source_timeout_ms: u64,
    /// Symmetric random-walk range used when every source fails.
    pub fallback_jitter: f64,
    /// Baseline the fallback walk starts from before any real quote.
    pub fallback_seed_price: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalystConfig {
    pub enabled: bool,
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON snapshot holding archived rounds.
    pub state_file: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break scheduling invariants.
    pub fn validate(&self) -> Result<()> {
        if self.game.round_duration_secs == 0 {
            bail!("game.round_duration_secs must be positive");
        }
        if self.game.tick_interval_secs == 0 {
            bail!("game.tick_interval_secs must be positive");
        }
        if self.game.history_capacity == 0 {
            bail!("game.history_capacity must be positive");
        }
        if !(self.price.fallback_seed_price.is_finite() && self.price.fallback_seed_price > 0.0) {
            bail!("price.fallback_seed_price must be a positive number");
        }
        if !(self.price.fallback_jitter.is_finite() && self.price.fallback_jitter >= 0.0) {
            bail!("price.fallback_jitter must be non-negative");
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
