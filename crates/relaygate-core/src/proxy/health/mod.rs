//! Account health: schedulability classification and pool diagnostics.
//!
//! - `classifier` - [`is_schedulable`] and the prioritised [`UnschedulableReason`]
//! - `window` - 5h / 7d vendor window inference
//! - `diagnostics` - [`diagnose`] and [`AccountFilterStats`]
//!
//! No I/O; callers pass an account snapshot and the current time.

mod classifier;
mod diagnostics;
mod window;


pub use classifier::{
    is_overloaded, is_rate_limited, is_schedulable, is_temp_unschedulable, unschedulable_reason,
    UnschedulableReason,
};
pub use diagnostics::{compact_duration, diagnose, format_recovery_hint, AccountFilterStats};
pub use window::{infer_rate_limit_window, RateLimitWindow};
