//! Proxy module - admission control and account resilience
//!
//! - Fixed-window rate limiting backed by Redis or an in-process store
//! - Account schedulability classification and pool diagnostics
//! - Automatic recovery of accounts in `Error`
//! - Prometheus metrics

pub mod health;
pub mod middleware;
pub mod prometheus;
pub mod rate_limit;
pub mod recovery;
