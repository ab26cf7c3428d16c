//! Inbound rate-limit rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// What the limiter does when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Admit the request and emit no quota headers
    #[default]
    FailOpen,
    /// Reject the request with degraded headers
    FailClose,
}

impl FailureMode {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FailOpen => "fail-open",
            Self::FailClose => "fail-close",
        }
    }
}

impl std::fmt::Display for FailureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A fixed-window limit applied per client to one route group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RateLimitRule {
    /// Route group key, part of the counter key
    #[validate(length(min = 1_u64))]
    pub key: String,
    /// Maximum requests per window
    #[validate(range(min = 1_u64))]
    pub limit: u64,
    /// Window length in seconds
    #[validate(range(min = 1_u64))]
    pub window_secs: u64,
    /// Behaviour when the counter store is unavailable
    #[serde(default)]
    pub failure_mode: FailureMode,
}

impl RateLimitRule {
    pub fn new(key: impl Into<String>, limit: u64, window_secs: u64, mode: FailureMode) -> Self {
        Self { key: key.into(), limit, window_secs, failure_mode: mode }
    }

    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

pub(super) fn default_rules() -> Vec<RateLimitRule> {
    vec![
        RateLimitRule::new("api", 120, 60, FailureMode::FailOpen),
        RateLimitRule::new("account_test", 10, 60, FailureMode::FailClose),
    ]
}
