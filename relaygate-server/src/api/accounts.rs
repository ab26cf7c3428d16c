//! Account handlers: list, get, mark failed, manual connectivity test

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relaygate_core::proxy::health::unschedulable_reason;
use relaygate_core::proxy::recovery::ProbeError;
use relaygate_core::AccountRepository;
use relaygate_types::{Account, AccountError, AccountStatus};

use super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AccountInfo {
    #[serde(flatten)]
    pub account: Account,
    pub schedulable: bool,
    pub unschedulable_reason: Option<&'static str>,
    pub unschedulable_until: Option<DateTime<Utc>>,
    /// Attempt number of the recovery sequence in flight, if any
    pub recovery_attempt: Option<u32>,
}

impl AccountInfo {
    fn new(account: Account, state: &AppState, now: DateTime<Utc>) -> Self {
        let reason = unschedulable_reason(&account, now);
        let recovery_attempt = state.coordinator().current_attempt(&account.id);
        Self {
            schedulable: reason.is_none(),
            unschedulable_reason: reason.as_ref().map(|r| r.label()),
            unschedulable_until: reason.as_ref().and_then(|r| r.until()),
            recovery_attempt,
            account,
        }
    }
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountInfo>>, ApiError> {
    let now = Utc::now();
    let accounts = state.repository().list().await?;
    Ok(Json(accounts.into_iter().map(|a| AccountInfo::new(a, &state, now)).collect()))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountInfo>, ApiError> {
    let account = state.repository().get_by_id(&id).await?;
    Ok(Json(AccountInfo::new(account, &state, Utc::now())))
}

#[derive(Deserialize, Default)]
pub struct MarkErrorRequest {
    pub message: Option<String>,
}

/// Record an upstream failure against an account. Moving it into `Error`
/// starts automatic recovery.
pub async fn mark_account_error(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<MarkErrorRequest>>,
) -> Result<Json<AccountInfo>, ApiError> {
    let account = state.repository().get_by_id(&id).await?;
    if account.status == AccountStatus::Disabled {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            AccountError::UnexpectedStatus {
                id,
                expected: "active or error".to_string(),
                actual: account.status.to_string(),
            },
        ));
    }

    let message = body
        .and_then(|Json(req)| req.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "marked failed via API".to_string());
    state.repository().mark_error(&id, &message)?;

    let account = state.repository().get_by_id(&id).await?;
    Ok(Json(AccountInfo::new(account, &state, Utc::now())))
}

#[derive(Serialize)]
pub struct TestResult {
    pub success: bool,
    pub status: AccountStatus,
    pub error: Option<String>,
}

/// Run one quiet connectivity probe now. A success clears `Error`.
pub async fn test_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TestResult>, ApiError> {
    let timeout = state.config().recovery.probe_timeout();
    let outcome = state.probe().test_connection_quiet(&id, timeout).await;

    let error = match outcome {
        Ok(()) => None,
        Err(ProbeError::AccountNotFound(id)) => {
            return Err(ApiError::new(StatusCode::NOT_FOUND, AccountError::NotFound { id }));
        },
        Err(e) => {
            tracing::info!(account_id = %id, "Manual account test failed: {}", e);
            Some(e.to_string())
        },
    };

    let account = state.repository().get_by_id(&id).await?;
    Ok(Json(TestResult { success: error.is_none(), status: account.status, error }))
}
