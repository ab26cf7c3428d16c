//! Automatic account recovery.
//!
//! - `coordinator` - [`RecoveryCoordinator`]: dedup, bounded retries, panic containment
//! - `scheduler` - [`TaskScheduler`] contract and the tokio [`TimingWheel`]
//! - `probe` - [`ConnectivityProbe`] and the status-clearing [`ClearingProbe`]
//! - `http_check` - [`HttpUpstreamCheck`], one cheap request per vendor

mod coordinator;
mod http_check;
mod probe;
mod scheduler;


pub use coordinator::RecoveryCoordinator;
pub use http_check::HttpUpstreamCheck;
pub use probe::{ClearingProbe, ConnectivityProbe, ProbeError, UpstreamCheck, CLEAR_ERROR_TIMEOUT};
pub use scheduler::{ScheduledTask, SchedulerError, TaskScheduler, TimingWheel};
