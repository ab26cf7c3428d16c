//! Application State
//!
//! Holds the account repository, the limiter and the recovery machinery
//! shared by every handler.

use std::sync::Arc;

use relaygate_core::modules::InMemoryAccountRepository;
use relaygate_core::proxy::middleware::RateLimitState;
use relaygate_core::proxy::rate_limit::{RateLimiter, WindowCounter};
use relaygate_core::proxy::recovery::{
    ClearingProbe, ConnectivityProbe, RecoveryCoordinator, TimingWheel, UpstreamCheck,
};
use relaygate_types::{FailureMode, GatewayConfig, RateLimitRule};

/// Route key for the admin API.
pub const API_RULE: &str = "api";
/// Route key for manual account tests; each one costs an upstream request.
pub const ACCOUNT_TEST_RULE: &str = "account_test";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: GatewayConfig,
    pub repository: Arc<InMemoryAccountRepository>,
    pub limiter: Arc<RateLimiter>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub scheduler: Arc<TimingWheel>,
    pub coordinator: Arc<RecoveryCoordinator>,
}

impl AppState {
    /// Wire the components. Must run inside the tokio runtime: the recovery
    /// coordinator subscribes to the repository immediately.
    pub fn new(
        config: GatewayConfig,
        repository: Arc<InMemoryAccountRepository>,
        counter: Arc<dyn WindowCounter>,
        upstream: Arc<dyn UpstreamCheck>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(counter, &config.counter_store));
        let probe: Arc<dyn ConnectivityProbe> =
            Arc::new(ClearingProbe::new(repository.clone(), upstream));
        let scheduler = TimingWheel::new();
        let coordinator = Arc::new(RecoveryCoordinator::new(
            repository.clone(),
            probe.clone(),
            scheduler.clone(),
            config.recovery.clone(),
        ));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repository,
                limiter,
                probe,
                scheduler,
                coordinator,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn repository(&self) -> &Arc<InMemoryAccountRepository> {
        &self.inner.repository
    }

    pub fn probe(&self) -> &Arc<dyn ConnectivityProbe> {
        &self.inner.probe
    }

    pub fn coordinator(&self) -> &Arc<RecoveryCoordinator> {
        &self.inner.coordinator
    }

    /// Middleware state for one route group. A rule missing from the config
    /// falls back to the built-in default for that key.
    pub fn rate_limit_state(&self, key: &str) -> RateLimitState {
        let rule = self.inner.config.rule(key).cloned().unwrap_or_else(|| {
            let rule = GatewayConfig::default()
                .rule(key)
                .cloned()
                .unwrap_or_else(|| RateLimitRule::new(key, 120, 60, FailureMode::FailOpen));
            tracing::warn!(
                route = %key,
                limit = rule.limit,
                mode = %rule.failure_mode,
                "[RateLimit] No rule configured, using default"
            );
            rule
        });
        RateLimitState::new(self.inner.limiter.clone(), rule)
    }

    /// Stop recovery: no new triggers, pending retries cancelled.
    pub fn shutdown(&self) {
        self.inner.coordinator.stop();
        self.inner.scheduler.shutdown();
    }
}
