//! Automatic recovery of accounts in `Error`.
//!
//! Per account: `Idle -> Probing(1) -> ... -> Probing(max)`, ending in
//! `Recovered` or `GaveUp`, both of which return to `Idle`. The in-flight map
//! holds exactly the accounts that are not `Idle`; its entry is the attempt
//! currently running or scheduled.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use relaygate_types::RecoveryConfig;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use super::probe::{ConnectivityProbe, ProbeError};
use super::scheduler::TaskScheduler;
use crate::modules::repository::{AccountErrorObserver, AccountRepository, RepositoryError};
use crate::proxy::prometheus;

/// How one attempt ended.
#[derive(Debug)]
enum AttemptResult {
    Recovered,
    /// Sequence is moot (account gone or no longer in `Error`)
    Aborted,
    Failed(String),
}

struct Inner {
    repository: Arc<dyn AccountRepository>,
    probe: Arc<dyn ConnectivityProbe>,
    scheduler: Arc<dyn TaskScheduler>,
    config: RecoveryConfig,
    /// account id -> attempt number in flight
    in_progress: DashMap<String, u32>,
    /// Reserved slots, bounded by `config.max_in_flight`
    slots: AtomicUsize,
}

/// Ownership of one account's in-flight marker.
///
/// Exactly one exists per running sequence and it travels with the attempt
/// future. Dropping it (outcome recorded, panic unwinding, task refused or
/// cancelled by the scheduler) releases the marker and the slot.
struct InFlight {
    inner: Arc<Inner>,
    account_id: String,
    outcome: Option<&'static str>,
}

impl InFlight {
    fn finish(mut self, outcome: &'static str) {
        self.outcome = Some(outcome);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_progress.remove(&self.account_id);
        self.inner.slots.fetch_sub(1, Ordering::SeqCst);
        match self.outcome {
            Some(outcome) => prometheus::record_recovery_outcome(outcome),
            None => tracing::warn!(
                account_id = %self.account_id,
                "[AutoRecovery] Sequence dropped before an outcome, marker released"
            ),
        }
    }
}

/// Drives bounded-retry connectivity probing for failed accounts.
///
/// Subscribes to the repository's error notifications on construction and
/// unsubscribes on [`stop`](Self::stop). At most one sequence per account
/// is in flight; further triggers for that account are no-ops until it ends.
pub struct RecoveryCoordinator {
    inner: Arc<Inner>,
}

/// Forwards repository error notifications without keeping the coordinator
/// alive.
struct TriggerOnError(Weak<Inner>);

impl AccountErrorObserver for TriggerOnError {
    fn on_account_error(&self, account_id: &str) {
        if let Some(inner) = self.0.upgrade() {
            Inner::trigger(&inner, account_id);
        }
    }
}

impl RecoveryCoordinator {
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        probe: Arc<dyn ConnectivityProbe>,
        scheduler: Arc<dyn TaskScheduler>,
        config: RecoveryConfig,
    ) -> Self {
        let inner = Arc::new(Inner {
            repository,
            probe,
            scheduler,
            config,
            in_progress: DashMap::new(),
            slots: AtomicUsize::new(0),
        });
        inner
            .repository
            .set_error_observer(Some(Arc::new(TriggerOnError(Arc::downgrade(&inner)))));
        tracing::info!(
            max_attempts = inner.config.max_attempts,
            retry_delay_secs = inner.config.retry_delay_secs,
            "[AutoRecovery] Subscribed to account error notifications"
        );
        Self { inner }
    }

    /// Start a recovery sequence unless one is already in flight for this
    /// account. Never blocks and never fails; outcomes are visible in logs and
    /// in the account's eventual status.
    pub fn trigger_recovery(&self, account_id: &str) {
        Inner::trigger(&self.inner, account_id);
    }

    /// Stop reacting to new account errors. Already scheduled attempts run
    /// to completion, or are dropped (releasing their marker) if the
    /// scheduler is shut down too.
    pub fn stop(&self) {
        self.inner.repository.set_error_observer(None);
        tracing::info!("[AutoRecovery] Stopped, error observer removed");
    }

    pub fn is_in_progress(&self, account_id: &str) -> bool {
        self.inner.in_progress.contains_key(account_id)
    }

    pub fn current_attempt(&self, account_id: &str) -> Option<u32> {
        self.inner.in_progress.get(account_id).map(|entry| *entry.value())
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_progress.len()
    }
}

impl Inner {
    fn trigger(this: &Arc<Self>, account_id: &str) {
        match this.in_progress.entry(account_id.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(account_id = %account_id, "[AutoRecovery] Already in progress");
                return;
            },
            Entry::Vacant(slot) => {
                if !this.reserve_slot() {
                    tracing::warn!(
                        account_id = %account_id,
                        limit = this.config.max_in_flight,
                        "[AutoRecovery] Too many recoveries in flight, trigger dropped"
                    );
                    return;
                }
                slot.insert(1);
            },
        }

        let marker =
            InFlight { inner: Arc::clone(this), account_id: account_id.to_string(), outcome: None };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(account_id = %account_id, "[AutoRecovery] No async runtime, trigger dropped");
            return;
        };

        runtime.spawn(Self::run_attempt(marker, 1));
    }

    fn reserve_slot(&self) -> bool {
        let limit = self.config.max_in_flight;
        self.slots
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < limit).then_some(n + 1))
            .is_ok()
    }

    /// One attempt plus its bookkeeping. Panics inside the attempt are caught
    /// here and count as a failed probe; a panic anywhere else drops the
    /// marker, which releases it.
    async fn run_attempt(marker: InFlight, attempt: u32) {
        prometheus::record_recovery_attempt();
        let this = Arc::clone(&marker.inner);
        let account_id = marker.account_id.clone();

        let result = AssertUnwindSafe(this.attempt(&account_id, attempt)).catch_unwind().await;
        let (result, panicked) = match result {
            Ok(result) => (result, false),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    account_id = %account_id,
                    attempt,
                    "[AutoRecovery] Panic during attempt: {}",
                    message
                );
                (AttemptResult::Failed(format!("panic: {message}")), true)
            },
        };

        match result {
            AttemptResult::Recovered => {
                tracing::info!(
                    account_id = %account_id,
                    attempt,
                    "[AutoRecovery] Account recovered"
                );
                marker.finish("recovered");
            },
            AttemptResult::Aborted => marker.finish("aborted"),
            AttemptResult::Failed(reason) => {
                let max_attempts = this.config.max_attempts;
                if attempt >= max_attempts {
                    tracing::error!(
                        account_id = %account_id,
                        attempts = attempt,
                        "[AutoRecovery] Max attempts reached, keeping error status: {}",
                        reason
                    );
                    marker.finish(if panicked { "panicked" } else { "gave_up" });
                } else {
                    Self::schedule_next(marker, attempt + 1);
                }
            },
        }
    }

    async fn attempt(&self, account_id: &str, attempt: u32) -> AttemptResult {
        let max_attempts = self.config.max_attempts;

        let account = match self.repository.get_by_id(account_id).await {
            Ok(account) => account,
            Err(RepositoryError::NotFound(_)) => {
                tracing::info!(account_id = %account_id, "[AutoRecovery] Account not found, aborting");
                return AttemptResult::Aborted;
            },
            Err(e) => {
                tracing::warn!(
                    account_id = %account_id,
                    attempt,
                    "[AutoRecovery] Could not load account: {}",
                    e
                );
                return AttemptResult::Failed(e.to_string());
            },
        };

        if !account.is_error() {
            tracing::info!(
                account_id = %account_id,
                status = %account.status,
                "[AutoRecovery] Account no longer in error status, aborting"
            );
            return AttemptResult::Aborted;
        }

        tracing::info!(
            account_id = %account_id,
            platform = %account.platform,
            "[AutoRecovery] Testing account (attempt {}/{})",
            attempt,
            max_attempts
        );

        match self.probe.test_connection_quiet(account_id, self.config.probe_timeout()).await {
            Ok(()) => AttemptResult::Recovered,
            Err(ProbeError::AccountNotFound(_)) => {
                tracing::info!(account_id = %account_id, "[AutoRecovery] Account removed during probe, aborting");
                AttemptResult::Aborted
            },
            Err(e) => {
                tracing::warn!(
                    account_id = %account_id,
                    "[AutoRecovery] Test failed (attempt {}/{}): {}",
                    attempt,
                    max_attempts,
                    e
                );
                AttemptResult::Failed(e.to_string())
            },
        }
    }

    /// Hand the next attempt, and the marker with it, to the scheduler.
    fn schedule_next(marker: InFlight, next_attempt: u32) {
        let this = Arc::clone(&marker.inner);
        let account_id = marker.account_id.clone();
        let key = format!("auto_recovery_{account_id}_{next_attempt}");

        if let Some(mut entry) = this.in_progress.get_mut(&account_id) {
            *entry = next_attempt;
        }

        let task = Self::run_attempt(marker, next_attempt).boxed();
        match this.scheduler.schedule(key, this.config.retry_delay(), task) {
            Ok(()) => {
                tracing::debug!(
                    account_id = %account_id,
                    next_attempt,
                    delay_secs = this.config.retry_delay_secs,
                    "[AutoRecovery] Next attempt scheduled"
                );
            },
            Err(e) => {
                // The refused task was dropped with its marker; a later
                // trigger starts over.
                tracing::warn!(
                    account_id = %account_id,
                    next_attempt,
                    "[AutoRecovery] Could not schedule retry, sequence ends: {}",
                    e
                );
                prometheus::record_recovery_outcome("unscheduled");
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

impl std::fmt::Debug for RecoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryCoordinator")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.in_progress.len())
            .finish()
    }
}
