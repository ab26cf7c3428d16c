//! Vendor rate-limit window inference.

use chrono::{DateTime, Utc};
use relaygate_types::WindowBands;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitWindow {
    FiveHour,
    SevenDay,
    Unknown,
}

impl RateLimitWindow {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FiveHour => "5h window",
            Self::SevenDay => "7d window",
            Self::Unknown => "unknown window",
        }
    }
}

impl std::fmt::Display for RateLimitWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Attribute a rate-limit interval to the vendor window it most likely is.
///
/// Missing timestamps or a non-positive interval are indeterminate.
pub fn infer_rate_limit_window(
    limited_at: Option<DateTime<Utc>>,
    reset_at: Option<DateTime<Utc>>,
    bands: &WindowBands,
) -> RateLimitWindow {
    let (Some(limited_at), Some(reset_at)) = (limited_at, reset_at) else {
        return RateLimitWindow::Unknown;
    };

    let Ok(interval) = (reset_at - limited_at).to_std() else {
        return RateLimitWindow::Unknown;
    };
    if interval.is_zero() {
        return RateLimitWindow::Unknown;
    }

    if bands.five_hour.contains(interval) {
        RateLimitWindow::FiveHour
    } else if bands.seven_day.contains(interval) {
        RateLimitWindow::SevenDay
    } else {
        RateLimitWindow::Unknown
    }
}
