//! Test helpers for relaygate-server unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use relaygate_core::modules::InMemoryAccountRepository;
use relaygate_core::proxy::rate_limit::MemoryWindowCounter;
use relaygate_core::proxy::recovery::{ProbeError, UpstreamCheck};
use relaygate_types::{Account, GatewayConfig};

use crate::state::AppState;

/// Upstream that answers according to a switch; counts calls.
#[derive(Default)]
pub struct StubUpstream {
    pub healthy: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubUpstream {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self { healthy: AtomicBool::new(true), calls: AtomicUsize::new(0) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl UpstreamCheck for StubUpstream {
    async fn check(&self, _account: &Account, _timeout: Duration) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProbeError::Upstream { status: 401, body: "invalid api key".to_string() })
        }
    }
}

/// Create an `AppState` backed by the in-process counter store.
pub fn test_app_state(
    config: GatewayConfig,
    accounts: Vec<Account>,
    upstream: Arc<StubUpstream>,
) -> AppState {
    let repository = Arc::new(InMemoryAccountRepository::with_accounts(accounts));
    AppState::new(config, repository, Arc::new(MemoryWindowCounter::new()), upstream)
}
