//! Deferred-callback scheduling.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub type ScheduledTask = BoxFuture<'static, ()>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("task scheduler is stopped")]
    Stopped,
    #[error("no async runtime available to run scheduled tasks")]
    NoRuntime,
}

/// Fires a task once after a delay.
///
/// A key that is already pending is not scheduled again (at-most-once per
/// key while pending).
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, key: String, delay: Duration, task: ScheduledTask)
        -> Result<(), SchedulerError>;
}

/// Tokio timing wheel: one sleeping task per pending key.
pub struct TimingWheel {
    pending: Arc<DashMap<String, ()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl TimingWheel {
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self { pending: Arc::new(DashMap::new()), shutdown_tx })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Cancel every pending timer and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let cancelled = self.pending.len();
        self.pending.clear();
        tracing::info!("[TimingWheel] Shut down, {} pending timers cancelled", cancelled);
    }
}

impl TaskScheduler for TimingWheel {
    fn schedule(
        &self,
        key: String,
        delay: Duration,
        task: ScheduledTask,
    ) -> Result<(), SchedulerError> {
        if self.is_stopped() {
            return Err(SchedulerError::Stopped);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        match self.pending.entry(key.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(key = %key, "[TimingWheel] Key already pending, ignoring");
                return Ok(());
            },
            Entry::Vacant(slot) => {
                slot.insert(());
            },
        }

        let pending = Arc::clone(&self.pending);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        runtime.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    pending.remove(&key);
                    task.await;
                }
                // The watch guard is dropped inside this future; it must not
                // outlive the branch or the task stops being Send.
                _ = async { shutdown_rx.wait_for(|stopped| *stopped).await.is_ok() } => {
                    pending.remove(&key);
                    tracing::debug!(key = %key, "[TimingWheel] Timer cancelled by shutdown");
                }
            }
        });

        Ok(())
    }
}

impl std::fmt::Debug for TimingWheel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingWheel")
            .field("pending", &self.pending.len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
