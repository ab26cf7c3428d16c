//! Top-level gateway configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use validator::Validate;

use super::probe::ProbeConfig;
use super::rate_limit::{default_rules, RateLimitRule};
use super::recovery::RecoveryConfig;
use super::windows::WindowBands;
use crate::error::ConfigError;

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(length(min = 1_u64))]
    pub host: String,
    #[validate(range(min = 1_u16))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8046 }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared counter store used by the rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct CounterStoreConfig {
    /// `redis://` URL; `None` selects the in-process store
    pub redis_url: Option<String>,
    /// Prefix prepended to every counter key
    pub key_prefix: String,
    /// Per-request bound on the store round trip in milliseconds
    #[validate(range(min = 1_u64, max = 10_000_u64))]
    pub timeout_ms: u64,
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self { redis_url: None, key_prefix: "rate_limit:".to_string(), timeout_ms: 200 }
    }
}

impl CounterStoreConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Full gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub counter_store: CounterStoreConfig,
    pub rate_limits: Vec<RateLimitRule>,
    pub recovery: RecoveryConfig,
    pub window_bands: WindowBands,
    pub probe: ProbeConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            counter_store: CounterStoreConfig::default(),
            rate_limits: default_rules(),
            recovery: RecoveryConfig::default(),
            window_bands: WindowBands::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Look up a rate-limit rule by its route key.
    pub fn rule(&self, key: &str) -> Option<&RateLimitRule> {
        self.rate_limits.iter().find(|r| r.key == key)
    }

    /// Validate every section, returning the first problem found.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.server.validate().map_err(|e| ConfigError::invalid("server", e.to_string()))?;
        self.counter_store
            .validate()
            .map_err(|e| ConfigError::invalid("counter_store", e.to_string()))?;
        self.recovery.validate().map_err(|e| ConfigError::invalid("recovery", e.to_string()))?;
        self.window_bands
            .validate()
            .map_err(|e| ConfigError::invalid("window_bands", e.to_string()))?;
        self.window_bands.check_disjoint()?;

        let mut seen = HashSet::new();
        for rule in &self.rate_limits {
            rule.validate()
                .map_err(|e| ConfigError::invalid(format!("rate_limits.{}", rule.key), e.to_string()))?;
            if !seen.insert(rule.key.as_str()) {
                return Err(ConfigError::invalid(
                    "rate_limits",
                    format!("duplicate rule key '{}'", rule.key),
                ));
            }
        }
        Ok(())
    }
}
