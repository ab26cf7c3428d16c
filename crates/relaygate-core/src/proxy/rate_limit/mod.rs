//! Distributed fixed-window rate limiting.
//!
//! - `counter` - [`WindowCounter`] contract, TTL coercion
//! - `redis_store` - Lua-scripted Redis backend shared across instances
//! - `memory_store` - single-process backend
//! - `limiter` - [`RateLimiter`] and the per-request [`RateLimitDecision`]

mod counter;
mod limiter;
mod memory_store;
mod redis_store;


pub use counter::{ceil_div, window_ttl_millis, CounterError, CounterOutcome, WindowCounter};
pub use limiter::{
    RateLimitDecision, RateLimiter, HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET, HEADER_X_LIMIT,
    HEADER_X_REMAINING, HEADER_X_RESET,
};
pub use memory_store::MemoryWindowCounter;
pub use redis_store::RedisWindowCounter;

use relaygate_types::CounterStoreConfig;
use std::sync::Arc;

/// Pick the counter backend the configuration asks for.
pub fn counter_from_config(
    config: &CounterStoreConfig,
) -> Result<Arc<dyn WindowCounter>, CounterError> {
    match config.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("[RateLimit] Using Redis counter store");
            Ok(Arc::new(RedisWindowCounter::open(url)?))
        },
        None => {
            tracing::info!("[RateLimit] Using in-process counter store (single instance only)");
            Ok(Arc::new(MemoryWindowCounter::new()))
        },
    }
}
