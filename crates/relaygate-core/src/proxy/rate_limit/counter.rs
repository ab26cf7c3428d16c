//! Fixed-window counter contract shared by every store backend.

use async_trait::async_trait;
use std::time::Duration;

/// Result of one increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOutcome {
    /// Post-increment value
    pub count: u64,
    /// Remaining time-to-live of the window in milliseconds
    pub ttl_millis: u64,
    /// The key had no expiry and was given one by this call
    pub repaired: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("counter store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed counter store reply: {0}")]
    MalformedReply(String),
}

impl From<redis::RedisError> for CounterError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Atomic "increment and ensure expiry" on a named counter.
///
/// * A call that creates the key (count becomes 1) sets the TTL to `window`.
/// * A call that finds the key without any TTL sets it to `window` and
///   reports `repaired = true`. The first call of a window never reports a
///   repair.
/// * Both steps happen in one operation from the store's point of view.
///
/// Store failures are returned as errors; no count is ever fabricated.
#[async_trait]
pub trait WindowCounter: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterOutcome, CounterError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Window length in whole milliseconds, never below 1.
pub fn window_ttl_millis(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Integer ceiling division; `0` when `divisor` is zero.
pub const fn ceil_div(value: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}
