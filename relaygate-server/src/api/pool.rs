//! Pool diagnostics and recovery status

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use relaygate_core::proxy::health::{diagnose, AccountFilterStats};
use relaygate_core::proxy::prometheus;
use relaygate_core::AccountRepository;
use relaygate_types::{AccountError, Platform};

use super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DiagnosticsQuery {
    pub platform: Option<Platform>,
}

#[derive(Serialize)]
pub struct PoolDiagnostics {
    pub platform: Option<Platform>,
    pub schedulable: usize,
    pub stats: AccountFilterStats,
    pub message: String,
    /// Set when no account can take traffic
    pub exhausted: Option<AccountError>,
}

pub async fn get_pool_diagnostics(
    State(state): State<AppState>,
    Query(query): Query<DiagnosticsQuery>,
) -> Result<Json<PoolDiagnostics>, ApiError> {
    let now = Utc::now();
    let accounts = state.repository().list().await?;
    let stats = diagnose(&accounts, query.platform, now, &state.config().window_bands);

    if query.platform.is_none() {
        prometheus::set_account_gauges(stats.total, stats.schedulable());
    }

    let message = stats.describe(now);
    let exhausted = (stats.schedulable() == 0)
        .then(|| AccountError::PoolExhausted { reason: message.clone() });

    Ok(Json(PoolDiagnostics {
        platform: query.platform,
        schedulable: stats.schedulable(),
        stats,
        message,
        exhausted,
    }))
}

#[derive(Serialize)]
pub struct RecoveryStatus {
    pub in_flight: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

pub async fn get_recovery_status(State(state): State<AppState>) -> Json<RecoveryStatus> {
    let recovery = &state.config().recovery;
    Json(RecoveryStatus {
        in_flight: state.coordinator().in_flight(),
        max_attempts: recovery.max_attempts,
        retry_delay_secs: recovery.retry_delay_secs,
    })
}
