//! Account schedulability predicate.
//!
//! Pure functions of the account's fault-signal fields and `now`.

use chrono::{DateTime, Utc};
use relaygate_types::{Account, AccountStatus};

/// Why an account cannot take traffic right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnschedulableReason {
    /// Not `Active` (faulted or disabled)
    Inactive(AccountStatus),
    RateLimited { reset_at: DateTime<Utc> },
    Overloaded { until: DateTime<Utc> },
    TempUnschedulable { until: DateTime<Utc>, reason: Option<String> },
}

impl UnschedulableReason {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inactive(_) => "inactive",
            Self::RateLimited { .. } => "rate_limited",
            Self::Overloaded { .. } => "overloaded",
            Self::TempUnschedulable { .. } => "temp_unschedulable",
        }
    }

    /// When the hold lifts; `None` for inactive accounts.
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Inactive(_) => None,
            Self::RateLimited { reset_at } => Some(*reset_at),
            Self::Overloaded { until } | Self::TempUnschedulable { until, .. } => Some(*until),
        }
    }
}

/// A vendor rate-limit window is in effect. Both timestamps must be set.
pub fn is_rate_limited(account: &Account, now: DateTime<Utc>) -> bool {
    rate_limit_reset(account, now).is_some()
}

pub fn is_overloaded(account: &Account, now: DateTime<Utc>) -> bool {
    account.overload_until.is_some_and(|until| now < until)
}

pub fn is_temp_unschedulable(account: &Account, now: DateTime<Utc>) -> bool {
    account.temp_unschedulable_until.is_some_and(|until| now < until)
}

fn rate_limit_reset(account: &Account, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match (account.rate_limited_at, account.rate_limit_reset_at) {
        (Some(_), Some(reset_at)) if now < reset_at => Some(reset_at),
        _ => None,
    }
}

pub fn is_schedulable(account: &Account, now: DateTime<Utc>) -> bool {
    unschedulable_reason(account, now).is_none()
}

/// First matching hold in fixed priority order: inactive, rate-limited,
/// overloaded, temp-unschedulable. `None` means schedulable.
pub fn unschedulable_reason(account: &Account, now: DateTime<Utc>) -> Option<UnschedulableReason> {
    if account.status != AccountStatus::Active {
        return Some(UnschedulableReason::Inactive(account.status));
    }
    if let Some(reset_at) = rate_limit_reset(account, now) {
        return Some(UnschedulableReason::RateLimited { reset_at });
    }
    if let Some(until) = account.overload_until.filter(|until| now < *until) {
        return Some(UnschedulableReason::Overloaded { until });
    }
    if let Some(until) = account.temp_unschedulable_until.filter(|until| now < *until) {
        let reason = account
            .temp_unschedulable_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        return Some(UnschedulableReason::TempUnschedulable { until, reason });
    }
    None
}
