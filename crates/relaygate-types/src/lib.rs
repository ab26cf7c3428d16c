//! # Relaygate Types
//!
//! Core types, models, and error definitions for the relaygate gateway.
//!
//! - **`error`** - Typed error hierarchy for accounts and configuration
//! - **`models`** - Domain models (Account, gateway configuration)
//!
//! ## Architecture Role
//!
//! `relaygate-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          relaygate-types (this crate)
//!                  │
//!                  ▼
//!           relaygate-core
//!                  │
//!                  ▼
//!          relaygate-server
//! ```

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{AccountError, ConfigError, Result, TypedError};

// Re-export core model types
pub use models::{
    Account, AccountStatus, CounterStoreConfig, FailureMode, GatewayConfig, Platform,
    ProbeConfig, RateLimitRule, RecoveryConfig, ServerConfig, WindowBand, WindowBands,
};
