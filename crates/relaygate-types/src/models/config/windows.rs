//! Vendor rate-limit window bands.
//!
//! Upstream vendors report rate-limit windows that are close to, but not
//! exactly, their nominal length. A band is a nominal target plus a
//! symmetric tolerance; an observed interval inside the band is attributed
//! to that window.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::error::ConfigError;

const FIVE_HOURS_SECS: u64 = 5 * 60 * 60;
const TWENTY_MINUTES_SECS: u64 = 20 * 60;
const SEVEN_DAYS_SECS: u64 = 7 * 24 * 60 * 60;
const SIX_HOURS_SECS: u64 = 6 * 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct WindowBand {
    /// Nominal window length in seconds
    #[validate(range(min = 1_u64))]
    pub target_secs: u64,
    /// Allowed deviation either side of the target, in seconds
    pub tolerance_secs: u64,
}

impl WindowBand {
    pub const fn new(target_secs: u64, tolerance_secs: u64) -> Self {
        Self { target_secs, tolerance_secs }
    }

    pub const fn target(&self) -> Duration {
        Duration::from_secs(self.target_secs)
    }

    pub const fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    /// Whether `|actual - target| <= tolerance`.
    pub fn contains(&self, actual: Duration) -> bool {
        let target = self.target();
        let diff = if actual >= target { actual - target } else { target - actual };
        diff <= self.tolerance()
    }

    fn lower_secs(&self) -> u64 {
        self.target_secs.saturating_sub(self.tolerance_secs)
    }

    fn upper_secs(&self) -> u64 {
        self.target_secs.saturating_add(self.tolerance_secs)
    }
}

/// The two vendor windows the classifier distinguishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct WindowBands {
    #[validate(nested)]
    pub five_hour: WindowBand,
    #[validate(nested)]
    pub seven_day: WindowBand,
}

impl Default for WindowBands {
    fn default() -> Self {
        Self {
            five_hour: WindowBand::new(FIVE_HOURS_SECS, TWENTY_MINUTES_SECS),
            seven_day: WindowBand::new(SEVEN_DAYS_SECS, SIX_HOURS_SECS),
        }
    }
}

impl WindowBands {
    /// The short band must sit entirely below the long band.
    pub fn check_disjoint(&self) -> Result<(), ConfigError> {
        if self.five_hour.upper_secs() >= self.seven_day.lower_secs() {
            return Err(ConfigError::invalid(
                "window_bands",
                format!(
                    "5h band [{}s, {}s] overlaps 7d band [{}s, {}s]",
                    self.five_hour.lower_secs(),
                    self.five_hour.upper_secs(),
                    self.seven_day.lower_secs(),
                    self.seven_day.upper_secs()
                ),
            ));
        }
        Ok(())
    }
}
