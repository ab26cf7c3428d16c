//! In-process account repository backed by a `DashMap`.
//!
//! Used by single-instance deployments (seeded from a JSON accounts file) and
//! by tests.

use async_trait::async_trait;
use dashmap::DashMap;
use relaygate_types::Account;
use std::path::Path;
use std::sync::Arc;

use super::repository::{
    AccountErrorObserver, AccountRepository, ErrorObserverSlot, RepoResult, RepositoryError,
};
use crate::error::AppResult;

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<String, Account>,
    observer: ErrorObserverSlot,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let repo = Self::new();
        for account in accounts {
            repo.upsert(account);
        }
        repo
    }

    /// Load accounts from a JSON array file.
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let accounts: Vec<Account> = serde_json::from_str(&content)?;
        tracing::info!("📊 Loaded {} accounts from {}", accounts.len(), path.display());
        Ok(Self::with_accounts(accounts))
    }

    pub fn upsert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn remove(&self, id: &str) -> Option<Account> {
        self.accounts.remove(id).map(|(_, account)| account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Apply an in-place edit to one account.
    pub fn update<F>(&self, id: &str, f: F) -> RepoResult<()>
    where
        F: FnOnce(&mut Account),
    {
        let mut entry =
            self.accounts.get_mut(id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        f(entry.value_mut());
        Ok(())
    }

    /// Move an account into `Error` and notify the registered observer.
    ///
    /// The shard guard is dropped before the observer runs so an observer
    /// may read the account back.
    pub fn mark_error(&self, id: &str, message: &str) -> RepoResult<()> {
        self.update(id, |account| account.set_error(message))?;
        tracing::warn!(account_id = %id, "Account marked as error: {}", message);
        self.observer.notify(id);
        Ok(())
    }

    pub fn has_error_observer(&self) -> bool {
        self.observer.is_set()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get_by_id(&self, id: &str) -> RepoResult<Account> {
        self.accounts
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list(&self) -> RepoResult<Vec<Account>> {
        let mut accounts: Vec<Account> =
            self.accounts.iter().map(|entry| entry.value().clone()).collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    async fn clear_error(&self, id: &str) -> RepoResult<bool> {
        let mut entry =
            self.accounts.get_mut(id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        Ok(entry.value_mut().clear_error())
    }

    fn set_error_observer(&self, observer: Option<Arc<dyn AccountErrorObserver>>) {
        self.observer.set(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use relaygate_types::{AccountStatus, Platform};
    use std::io::Write;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl AccountErrorObserver for Recorder {
        fn on_account_error(&self, account_id: &str) {
            self.0.lock().push(account_id.to_string());
        }
    }

    #[tokio::test]
    async fn test_clear_error_is_idempotent() {
        let repo = InMemoryAccountRepository::with_accounts([Account::new("a", Platform::Claude)]);
        repo.mark_error("a", "401").unwrap();

        assert!(repo.clear_error("a").await.unwrap());
        assert!(!repo.clear_error("a").await.unwrap());
        assert_eq!(repo.get_by_id("a").await.unwrap().status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_clear_error_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let err = repo.clear_error("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_clear_error_leaves_disabled_alone() {
        let mut account = Account::new("d", Platform::Gemini);
        account.status = AccountStatus::Disabled;
        let repo = InMemoryAccountRepository::with_accounts([account]);

        assert!(!repo.clear_error("d").await.unwrap());
        assert_eq!(repo.get_by_id("d").await.unwrap().status, AccountStatus::Disabled);
    }

    #[test]
    fn test_mark_error_notifies_observer() {
        let repo = InMemoryAccountRepository::with_accounts([
            Account::new("a", Platform::Claude),
            Account::new("b", Platform::OpenAi),
        ]);
        let recorder = Arc::new(Recorder::default());
        repo.set_error_observer(Some(recorder.clone()));

        repo.mark_error("b", "timeout").unwrap();
        assert!(repo.mark_error("missing", "x").is_err());

        repo.set_error_observer(None);
        repo.mark_error("a", "timeout").unwrap();

        assert_eq!(*recorder.0.lock(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"a","platform":"claude","credential":"sk-1"}},
                {{"id":"b","platform":"gemini","status":"error","error_message":"403"}}]"#
        )
        .unwrap();

        let repo = InMemoryAccountRepository::from_json_file(file.path()).unwrap();
        assert_eq!(repo.len(), 2);

        let accounts = repo.list().await.unwrap();
        assert_eq!(accounts[0].credential.as_deref(), Some("sk-1"));
        assert!(accounts[1].is_error());
    }
}
