//! # Relaygate Core
//!
//! Admission control and resilience for the relaygate gateway.
//!
//! ## Architecture
//!
//! ```text
//! relaygate-core/src/
//! ├── modules/
//! │   ├── config.rs             # GatewayConfig load/save
//! │   ├── logger.rs             # tracing subscriber setup
//! │   ├── repository.rs         # AccountRepository trait + error observer
//! │   └── memory_repository.rs  # DashMap-backed repository
//! └── proxy/
//!     ├── rate_limit/           # window counter stores + RateLimiter
//!     ├── middleware/           # axum rate-limit middleware
//!     ├── health/               # schedulability classifier + pool diagnostics
//!     ├── recovery/             # recovery coordinator, timing wheel, probes
//!     └── prometheus.rs         # metrics endpoint
//! ```
//!
//! Inbound requests pass the [`proxy::rate_limit::RateLimiter`]; upstream
//! failures mark an account `Error` through the repository, which notifies
//! the [`proxy::recovery::RecoveryCoordinator`]; successful probes clear the
//! error so the account becomes schedulable again.

#![allow(
    clippy::significant_drop_tightening,
    reason = "DashMap guards in async code require careful lifetime management"
)]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(clippy::implicit_clone, reason = "Explicit .clone() vs .to_string() is stylistic")]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::assertions_on_result_states
    )
)]

pub mod error;
pub mod modules;
pub mod proxy;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use modules::repository::{AccountErrorObserver, AccountRepository, RepositoryError};
pub use proxy::health::{diagnose, is_schedulable, AccountFilterStats};
pub use proxy::rate_limit::{RateLimitDecision, RateLimiter, WindowCounter};
pub use proxy::recovery::{RecoveryCoordinator, TimingWheel};
pub use relaygate_types::{Account, AccountStatus, GatewayConfig, Platform};
