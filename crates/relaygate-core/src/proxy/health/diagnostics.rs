//! Pool-level schedulability diagnostics.
//!
//! Explains an empty pool to operators: how many candidates were considered,
//! which hold each unschedulable one is under, and when the earliest of them
//! lifts.

use chrono::{DateTime, SecondsFormat, Utc};
use relaygate_types::{Account, Platform, WindowBands};
use serde::Serialize;

use super::classifier::{unschedulable_reason, UnschedulableReason};
use super::window::{infer_rate_limit_window, RateLimitWindow};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountFilterStats {
    /// Active accounts considered (after the platform filter)
    pub total: usize,
    pub unschedulable: usize,
    pub rate_limited: usize,
    pub rate_limited_5h: usize,
    pub rate_limited_7d: usize,
    pub rate_limited_other: usize,
    pub overloaded: usize,
    pub temp_unschedulable: usize,
    pub earliest_rate_limit_reset: Option<DateTime<Utc>>,
    pub earliest_overload_until: Option<DateTime<Utc>>,
    pub earliest_temp_unschedulable_until: Option<DateTime<Utc>>,
    /// First non-empty temporary hold reason seen
    pub temp_unschedulable_reason: Option<String>,
}

impl AccountFilterStats {
    pub const fn schedulable(&self) -> usize {
        self.total.saturating_sub(self.unschedulable)
    }

    /// Label for the rate-limited bucket.
    pub const fn dominant_window(&self) -> &'static str {
        if self.rate_limited == 0 {
            RateLimitWindow::Unknown.label()
        } else if self.rate_limited_5h == self.rate_limited {
            RateLimitWindow::FiveHour.label()
        } else if self.rate_limited_7d == self.rate_limited {
            RateLimitWindow::SevenDay.label()
        } else {
            "mixed windows"
        }
    }

    /// Operator-facing summary of the pool.
    pub fn describe(&self, now: DateTime<Utc>) -> String {
        if self.total == 0 {
            return "no active accounts".to_string();
        }

        let mut parts = Vec::new();
        if self.rate_limited > 0 {
            parts.push(format!(
                "rate limited: {} ({}; {})",
                self.rate_limited,
                self.dominant_window(),
                format_recovery_hint(self.earliest_rate_limit_reset, now)
            ));
        }
        if self.overloaded > 0 {
            parts.push(format!(
                "overloaded: {} ({})",
                self.overloaded,
                format_recovery_hint(self.earliest_overload_until, now)
            ));
        }
        if self.temp_unschedulable > 0 {
            let reason = self
                .temp_unschedulable_reason
                .as_deref()
                .map(|r| format!("reason: {r}; "))
                .unwrap_or_default();
            parts.push(format!(
                "temporarily unschedulable: {} ({}{})",
                self.temp_unschedulable,
                reason,
                format_recovery_hint(self.earliest_temp_unschedulable_until, now)
            ));
        }

        let mut summary =
            format!("{}/{} active accounts unschedulable", self.unschedulable, self.total);
        if !parts.is_empty() {
            summary.push_str(": ");
            summary.push_str(&parts.join(", "));
        }
        summary
    }

    fn record(&mut self, reason: UnschedulableReason, window: RateLimitWindow) {
        match reason {
            UnschedulableReason::RateLimited { reset_at } => {
                self.rate_limited += 1;
                record_earliest(&mut self.earliest_rate_limit_reset, reset_at);
                match window {
                    RateLimitWindow::FiveHour => self.rate_limited_5h += 1,
                    RateLimitWindow::SevenDay => self.rate_limited_7d += 1,
                    RateLimitWindow::Unknown => self.rate_limited_other += 1,
                }
            },
            UnschedulableReason::Overloaded { until } => {
                self.overloaded += 1;
                record_earliest(&mut self.earliest_overload_until, until);
            },
            UnschedulableReason::TempUnschedulable { until, reason } => {
                self.temp_unschedulable += 1;
                record_earliest(&mut self.earliest_temp_unschedulable_until, until);
                if self.temp_unschedulable_reason.is_none() {
                    self.temp_unschedulable_reason = reason;
                }
            },
            UnschedulableReason::Inactive(_) => {},
        }
    }
}

fn record_earliest(slot: &mut Option<DateTime<Utc>>, candidate: DateTime<Utc>) {
    if slot.map_or(true, |current| candidate < current) {
        *slot = Some(candidate);
    }
}

/// Classify a snapshot of accounts.
///
/// Only `Active` accounts count, optionally narrowed to one platform. Each
/// unschedulable account lands in exactly one bucket.
pub fn diagnose(
    accounts: &[Account],
    platform: Option<Platform>,
    now: DateTime<Utc>,
    bands: &WindowBands,
) -> AccountFilterStats {
    let mut stats = AccountFilterStats::default();

    for account in accounts {
        if !account.is_active() {
            continue;
        }
        if platform.is_some_and(|p| p != account.platform) {
            continue;
        }

        stats.total += 1;
        if let Some(reason) = unschedulable_reason(account, now) {
            stats.unschedulable += 1;
            let window = infer_rate_limit_window(
                account.rate_limited_at,
                account.rate_limit_reset_at,
                bands,
            );
            stats.record(reason, window);
        }
    }

    stats
}

/// `earliest recovery at <RFC 3339 UTC>, in <compact duration>`
pub fn format_recovery_hint(reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(reset_at) = reset_at else {
        return "recovery time unknown".to_string();
    };
    let remaining = (reset_at - now).max(chrono::Duration::zero());
    format!(
        "earliest recovery at {}, in {}",
        reset_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        compact_duration(remaining)
    )
}

/// Largest two non-zero units after rounding to the nearest minute:
/// `1d4h`, `2d`, `3h12m`, `5h`, `7m`, or `<1m`.
pub fn compact_duration(duration: chrono::Duration) -> String {
    const MINUTE_MS: i64 = 60_000;

    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return "<1m".to_string();
    }
    let minutes = millis.saturating_add(MINUTE_MS / 2) / MINUTE_MS;
    if minutes == 0 {
        return "<1m".to_string();
    }

    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;

    match (days, hours, mins) {
        (d, h, _) if d > 0 && h > 0 => format!("{d}d{h}h"),
        (d, _, _) if d > 0 => format!("{d}d"),
        (_, h, m) if h > 0 && m > 0 => format!("{h}h{m}m"),
        (_, h, _) if h > 0 => format!("{h}h"),
        (_, _, m) => format!("{m}m"),
    }
}
