//! Prometheus metrics for admission control and recovery.
//!
//! - `relaygate_rate_limit_decisions_total{route,outcome}` - Counter of limiter decisions
//! - `relaygate_rate_limit_ttl_repairs_total{route}` - Counter of counters healed of a missing TTL
//! - `relaygate_recovery_attempts_total` - Counter of recovery probe attempts
//! - `relaygate_recovery_outcomes_total{outcome}` - Counter of finished recovery sequences
//! - `relaygate_accounts_total` - Gauge of considered accounts
//! - `relaygate_accounts_schedulable` - Gauge of schedulable accounts
//! - `relaygate_uptime_seconds` - Gauge of server uptime
//!
//! Recording before [`init_metrics`] is a no-op, so library code records
//! unconditionally.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

/// Global Prometheus handle for rendering metrics
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global server start time for uptime calculation
static METRICS_START_TIME: OnceLock<Instant> = OnceLock::new();

/// Install the Prometheus recorder. Idempotent; returns `None` if another
/// recorder already owns the global slot.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let _ = METRICS_START_TIME.get_or_init(Instant::now);

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Some(handle.clone());
    }

    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!("Failed to install Prometheus metrics recorder: {}", e);
            return None;
        },
    };

    describe_counter!(
        "relaygate_rate_limit_decisions_total",
        "Rate limiter decisions by route and outcome"
    );
    describe_counter!(
        "relaygate_rate_limit_ttl_repairs_total",
        "Counters found without an expiry and repaired"
    );
    describe_counter!("relaygate_recovery_attempts_total", "Recovery probe attempts started");
    describe_counter!(
        "relaygate_recovery_outcomes_total",
        "Finished recovery sequences by outcome"
    );
    describe_gauge!("relaygate_accounts_total", "Accounts considered for scheduling");
    describe_gauge!("relaygate_accounts_schedulable", "Accounts currently schedulable");
    describe_gauge!("relaygate_uptime_seconds", "Server uptime in seconds");

    Some(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
/// Returns None if metrics have not been initialized.
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render metrics in Prometheus text exposition format.
pub fn render_metrics() -> String {
    if let Some(start) = METRICS_START_TIME.get() {
        gauge!("relaygate_uptime_seconds").set(start.elapsed().as_secs_f64());
    }

    get_prometheus_handle().map_or_else(
        || "# Metrics not initialized\n".to_string(),
        PrometheusHandle::render,
    )
}

pub fn record_rate_limit_decision(route: &str, outcome: &'static str) {
    counter!(
        "relaygate_rate_limit_decisions_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_ttl_repair(route: &str) {
    counter!("relaygate_rate_limit_ttl_repairs_total", "route" => route.to_string()).increment(1);
}

pub fn record_recovery_attempt() {
    counter!("relaygate_recovery_attempts_total").increment(1);
}

pub fn record_recovery_outcome(outcome: &'static str) {
    counter!("relaygate_recovery_outcomes_total", "outcome" => outcome).increment(1);
}

#[allow(clippy::cast_precision_loss, reason = "account counts are far below 2^52")]
pub fn set_account_gauges(total: usize, schedulable: usize) {
    gauge!("relaygate_accounts_total").set(total as f64);
    gauge!("relaygate_accounts_schedulable").set(schedulable as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_and_renders() {
        let first = init_metrics();
        let second = init_metrics();
        assert_eq!(first.is_some(), second.is_some());

        record_rate_limit_decision("api", "admitted");
        record_recovery_outcome("recovered");
        set_account_gauges(4, 3);

        if first.is_some() {
            let text = render_metrics();
            assert!(text.contains("relaygate_rate_limit_decisions_total"));
            assert!(text.contains("relaygate_accounts_schedulable 3"));
        }
    }
}
