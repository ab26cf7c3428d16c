//! Connectivity probes.
//!
//! [`ConnectivityProbe`] is what the coordinator calls. [`ClearingProbe`] is
//! the production implementation: it runs one raw [`UpstreamCheck`] and, when
//! the upstream answers, clears the account's `Error` status itself. The
//! coordinator never flips status; manual tests and auto-recovery share this
//! single clearing path.

use async_trait::async_trait;
use relaygate_types::Account;
use std::sync::Arc;
use std::time::Duration;

use crate::modules::repository::{AccountRepository, RepositoryError};

/// Bound on the clear-error write after a successful probe.
pub const CLEAR_ERROR_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("account {0} has no credential configured")]
    MissingCredential(String),
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("connectivity OK but clear-error failed: {0}")]
    ClearFailed(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for ProbeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::AccountNotFound(id),
            RepositoryError::Storage(message) => Self::Repository(message),
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Request(format!("timed out: {err}"))
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Bounded, non-streaming, minimal-cost request against an account's real
/// upstream.
///
/// Side effect: on success an account in `Error` is transitioned back to
/// `Active`.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn test_connection_quiet(&self, account_id: &str, timeout: Duration)
        -> Result<(), ProbeError>;
}

/// One raw request to the vendor. No account state is touched.
#[async_trait]
pub trait UpstreamCheck: Send + Sync {
    async fn check(&self, account: &Account, timeout: Duration) -> Result<(), ProbeError>;
}

pub struct ClearingProbe {
    repository: Arc<dyn AccountRepository>,
    upstream: Arc<dyn UpstreamCheck>,
}

impl ClearingProbe {
    pub fn new(repository: Arc<dyn AccountRepository>, upstream: Arc<dyn UpstreamCheck>) -> Self {
        Self { repository, upstream }
    }
}

#[async_trait]
impl ConnectivityProbe for ClearingProbe {
    async fn test_connection_quiet(
        &self,
        account_id: &str,
        timeout: Duration,
    ) -> Result<(), ProbeError> {
        let account = self.repository.get_by_id(account_id).await?;

        match tokio::time::timeout(timeout, self.upstream.check(&account, timeout)).await {
            Ok(result) => result?,
            Err(_) => return Err(ProbeError::Timeout(timeout)),
        }

        if !account.is_error() {
            return Ok(());
        }

        match tokio::time::timeout(CLEAR_ERROR_TIMEOUT, self.repository.clear_error(account_id))
            .await
        {
            Ok(Ok(true)) => {
                tracing::info!(
                    account_id = %account_id,
                    platform = %account.platform,
                    "Connectivity restored, account error cleared"
                );
                Ok(())
            },
            Ok(Ok(false)) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::ClearFailed(e.to_string())),
            Err(_) => Err(ProbeError::ClearFailed(format!(
                "timed out after {:?}",
                CLEAR_ERROR_TIMEOUT
            ))),
        }
    }
}

impl std::fmt::Debug for ClearingProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearingProbe").finish_non_exhaustive()
    }
}
