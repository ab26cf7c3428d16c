//! Automatic account recovery settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Probe attempts per recovery sequence (default: 3)
    #[validate(range(min = 1_u32, max = 20_u32))]
    pub max_attempts: u32,
    /// Delay between attempts in seconds (default: 30)
    pub retry_delay_secs: u64,
    /// Upper bound for a single connectivity probe (default: 30)
    #[validate(range(min = 1_u64))]
    pub probe_timeout_secs: u64,
    /// Maximum number of accounts with a sequence in flight
    #[validate(range(min = 1_usize))]
    pub max_in_flight: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, retry_delay_secs: 30, probe_timeout_secs: 30, max_in_flight: 1024 }
    }
}

impl RecoveryConfig {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
