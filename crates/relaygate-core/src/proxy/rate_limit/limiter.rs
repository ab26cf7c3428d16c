//! Per-route, per-client admission gate.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use relaygate_types::{CounterStoreConfig, FailureMode, RateLimitRule};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::counter::{ceil_div, window_ttl_millis, CounterError, CounterOutcome, WindowCounter};
use crate::proxy::prometheus;

const MILLIS_PER_SECOND: u64 = 1000;

pub const HEADER_LIMIT: &str = "ratelimit-limit";
pub const HEADER_REMAINING: &str = "ratelimit-remaining";
pub const HEADER_RESET: &str = "ratelimit-reset";
pub const HEADER_X_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_X_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_X_RESET: &str = "x-ratelimit-reset";

/// Outcome of one admission check. Recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until the window resets, at least 1 when headers are emitted
    pub reset_seconds: u64,
    /// The request must be rejected
    pub exceeded: bool,
    /// The counter store failed and the failure mode decided
    pub degraded: bool,
}

impl RateLimitDecision {
    pub fn from_outcome(outcome: CounterOutcome, limit: u64) -> Self {
        Self {
            count: outcome.count,
            limit,
            remaining: limit.saturating_sub(outcome.count),
            reset_seconds: ceil_div(outcome.ttl_millis, MILLIS_PER_SECOND).max(1),
            exceeded: outcome.count > limit,
            degraded: false,
        }
    }

    /// Decision used when the counter store is unavailable.
    pub fn degraded(mode: FailureMode, limit: u64, window: Duration) -> Self {
        match mode {
            FailureMode::FailOpen => Self {
                count: 0,
                limit,
                remaining: limit,
                reset_seconds: 0,
                exceeded: false,
                degraded: true,
            },
            FailureMode::FailClose => Self {
                count: 0,
                limit,
                remaining: 0,
                reset_seconds: ceil_div(window_ttl_millis(window), MILLIS_PER_SECOND).max(1),
                exceeded: true,
                degraded: true,
            },
        }
    }

    pub const fn is_admitted(&self) -> bool {
        !self.exceeded
    }

    /// Fail-open admissions carry no quota headers: there is no real quota
    /// to report.
    pub const fn emits_headers(&self) -> bool {
        !(self.degraded && !self.exceeded)
    }

    pub const fn retry_after(&self) -> Option<u64> {
        if self.exceeded {
            Some(self.reset_seconds)
        } else {
            None
        }
    }

    pub const fn outcome_label(&self) -> &'static str {
        match (self.degraded, self.exceeded) {
            (false, false) => "admitted",
            (false, true) => "rejected",
            (true, false) => "degraded_open",
            (true, true) => "degraded_close",
        }
    }

    /// Write the quota headers. `now_unix` anchors the absolute reset time.
    pub fn write_headers(&self, headers: &mut HeaderMap, now_unix: i64) {
        if !self.emits_headers() {
            return;
        }

        let reset_at = now_unix.saturating_add(i64::try_from(self.reset_seconds).unwrap_or(i64::MAX));
        let pairs: [(&'static str, String); 6] = [
            (HEADER_LIMIT, self.limit.to_string()),
            (HEADER_REMAINING, self.remaining.to_string()),
            (HEADER_RESET, self.reset_seconds.to_string()),
            (HEADER_X_LIMIT, self.limit.to_string()),
            (HEADER_X_REMAINING, self.remaining.to_string()),
            (HEADER_X_RESET, reset_at.to_string()),
        ];
        for (name, value) in pairs {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }

        if let Some(retry_after) = self.retry_after() {
            headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
    }
}

/// Fixed-window limiter over a shared [`WindowCounter`].
///
/// Never waits on the store longer than `store_timeout`; a slow store is
/// handled like an unavailable one.
pub struct RateLimiter {
    counter: Arc<dyn WindowCounter>,
    key_prefix: String,
    store_timeout: Duration,
}

impl RateLimiter {
    pub fn new(
        counter: Arc<dyn WindowCounter>,
        key_prefix: impl Into<String>,
        store_timeout: Duration,
    ) -> Self {
        Self { counter, key_prefix: key_prefix.into(), store_timeout }
    }

    pub fn from_config(counter: Arc<dyn WindowCounter>, config: &CounterStoreConfig) -> Self {
        Self::new(counter, config.key_prefix.clone(), config.timeout())
    }

    /// `<prefix><route_key>:<client>`
    pub fn counter_key(&self, route_key: &str, client: &str) -> String {
        format!("{}{}:{}", self.key_prefix, route_key, client)
    }

    pub async fn check(
        &self,
        route_key: &str,
        client: &str,
        limit: u64,
        window: Duration,
        mode: FailureMode,
    ) -> RateLimitDecision {
        let key = self.counter_key(route_key, client);

        let result =
            match tokio::time::timeout(self.store_timeout, self.counter.increment(&key, window))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CounterError::Timeout(self.store_timeout)),
            };

        let decision = match result {
            Ok(outcome) => {
                if outcome.repaired {
                    tracing::warn!(
                        route = %route_key,
                        key = %key,
                        ttl_ms = outcome.ttl_millis,
                        "[RateLimit] Counter had no expiry, TTL repaired"
                    );
                    prometheus::record_ttl_repair(route_key);
                }
                RateLimitDecision::from_outcome(outcome, limit)
            },
            Err(e) => {
                tracing::warn!(
                    route = %route_key,
                    mode = %mode,
                    backend = self.counter.backend(),
                    "[RateLimit] Counter store error: {}",
                    e
                );
                RateLimitDecision::degraded(mode, limit, window)
            },
        };

        prometheus::record_rate_limit_decision(route_key, decision.outcome_label());
        decision
    }

    pub async fn check_rule(&self, rule: &RateLimitRule, client: &str) -> RateLimitDecision {
        self.check(&rule.key, client, rule.limit, rule.window(), rule.failure_mode).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("backend", &self.counter.backend())
            .field("key_prefix", &self.key_prefix)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}
