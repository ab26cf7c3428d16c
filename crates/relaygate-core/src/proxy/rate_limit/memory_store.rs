//! In-process window counter.
//!
//! Atomic per key under the DashMap shard lock, which is enough for a single
//! gateway instance. Horizontally scaled deployments must use the Redis
//! store: nothing here is shared between processes.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::counter::{window_ttl_millis, CounterError, CounterOutcome, WindowCounter};

const CLEANUP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct Slot {
    count: u64,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct MemoryWindowCounter {
    slots: DashMap<String, Slot>,
}

impl MemoryWindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the expiry of a live key, leaving its count in place.
    ///
    /// Reproduces the leaked-counter state the repair path heals.
    pub fn strip_expiry(&self, key: &str) -> bool {
        self.slots.get_mut(key).map(|mut slot| slot.expires_at = None).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn cleanup_if_needed(&self, now: Instant) {
        if self.slots.len() > CLEANUP_THRESHOLD {
            self.slots.retain(|_, slot| slot.expires_at.map_or(true, |t| now < t));
        }
    }
}

#[async_trait]
impl WindowCounter for MemoryWindowCounter {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterOutcome, CounterError> {
        let now = Instant::now();
        let ttl = Duration::from_millis(window_ttl_millis(window));
        self.cleanup_if_needed(now);

        let mut slot =
            self.slots.entry(key.to_string()).or_insert(Slot { count: 0, expires_at: None });

        // An expired key behaves exactly like an absent one.
        if slot.expires_at.is_some_and(|t| now >= t) {
            slot.count = 0;
            slot.expires_at = None;
        }

        slot.count = slot.count.saturating_add(1);

        let (remaining, repaired) = if slot.count == 1 {
            slot.expires_at = Some(now + ttl);
            (ttl, false)
        } else if let Some(expires_at) = slot.expires_at {
            (expires_at.saturating_duration_since(now), false)
        } else {
            slot.expires_at = Some(now + ttl);
            (ttl, true)
        };

        Ok(CounterOutcome {
            count: slot.count,
            ttl_millis: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            repaired,
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
