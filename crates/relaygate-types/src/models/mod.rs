//! Core domain models for relaygate.
//!
//! This module contains the data structures shared by the core and server.

mod account;
mod config;

// Re-export all models
pub use account::{Account, AccountStatus, Platform};
pub use config::{
    CounterStoreConfig, FailureMode, GatewayConfig, ProbeConfig, RateLimitRule, RecoveryConfig,
    ServerConfig, WindowBand, WindowBands,
};
