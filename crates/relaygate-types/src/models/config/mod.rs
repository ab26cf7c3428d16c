//! Gateway configuration models.

mod gateway;
mod probe;
mod rate_limit;
mod recovery;
mod windows;

pub use gateway::{CounterStoreConfig, GatewayConfig, ServerConfig};
pub use probe::ProbeConfig;
pub use rate_limit::{FailureMode, RateLimitRule};
pub use recovery::RecoveryConfig;
pub use windows::{WindowBand, WindowBands};
