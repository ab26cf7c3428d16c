//! Account repository trait for storage abstraction.
//!
//! The admission core only needs three things from account storage: fetch one
//! account, clear its `Error` status, and be told when an account enters
//! `Error`. The last one is an explicit observer registration rather than a
//! bare callback so that registration and removal are visible at the call
//! site.

use async_trait::async_trait;
use parking_lot::RwLock;
use relaygate_types::{Account, AccountError};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Account not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<RepositoryError> for AccountError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound { id },
            RepositoryError::Storage(message) => Self::StorageError { message },
        }
    }
}

/// Receives a notification every time an account is marked `Error`.
///
/// Invoked synchronously on the thread that marked the account, so
/// implementations must hand off any real work.
pub trait AccountErrorObserver: Send + Sync {
    fn on_account_error(&self, account_id: &str);
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Account>;

    async fn list(&self) -> RepoResult<Vec<Account>>;

    /// Transition `Error -> Active`. Idempotent; returns whether a transition
    /// actually happened.
    async fn clear_error(&self, id: &str) -> RepoResult<bool>;

    /// Register (`Some`) or remove (`None`) the error observer.
    fn set_error_observer(&self, observer: Option<Arc<dyn AccountErrorObserver>>);
}

/// Single observer slot shared by repository implementations.
#[derive(Default)]
pub struct ErrorObserverSlot {
    inner: RwLock<Option<Arc<dyn AccountErrorObserver>>>,
}

impl ErrorObserverSlot {
    pub fn set(&self, observer: Option<Arc<dyn AccountErrorObserver>>) {
        *self.inner.write() = observer;
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Notify the current observer, if any. The lock is released before the
    /// observer runs.
    pub fn notify(&self, account_id: &str) {
        let observer = self.inner.read().clone();
        if let Some(observer) = observer {
            observer.on_account_error(account_id);
        }
    }
}

impl std::fmt::Debug for ErrorObserverSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorObserverSlot").field("set", &self.is_set()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl AccountErrorObserver for Recorder {
        fn on_account_error(&self, account_id: &str) {
            self.0.lock().push(account_id.to_string());
        }
    }

    #[test]
    fn test_slot_notifies_until_cleared() {
        let slot = ErrorObserverSlot::default();
        let recorder = Arc::new(Recorder::default());

        slot.notify("before");
        slot.set(Some(recorder.clone()));
        slot.notify("a");
        slot.set(None);
        slot.notify("after");

        assert_eq!(*recorder.0.lock(), vec!["a".to_string()]);
        assert!(!slot.is_set());
    }

    #[test]
    fn test_repository_error_maps_to_account_error() {
        let err: AccountError = RepositoryError::NotFound("x".to_string()).into();
        assert_eq!(err, AccountError::NotFound { id: "x".to_string() });
    }
}
