//! API Routes
//!
//! Admin endpoints under `/api`. The account test route is mounted by the
//! router so it can carry its own rate-limit rule.

pub mod accounts;
mod pool;


use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};

use relaygate_core::RepositoryError;
use relaygate_types::{AccountError, TypedError};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/:id", get(accounts::get_account))
        .route("/accounts/:id/error", post(accounts::mark_account_error))
        // Pool
        .route("/pool/diagnostics", get(pool::get_pool_diagnostics))
        .route("/recovery", get(pool::get_recovery_status))
}

/// Typed error body: `{"error": {"domain": ..., "error": {...}}, "message": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: TypedError,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<TypedError>) -> Self {
        Self { status, error: error.into() }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let status =
            if err.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::INTERNAL_SERVER_ERROR };
        Self::new(status, AccountError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.error.to_string();
        (self.status, Json(serde_json::json!({"error": self.error, "message": message})))
            .into_response()
    }
}
