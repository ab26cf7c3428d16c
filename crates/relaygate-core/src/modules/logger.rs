//! Tracing subscriber setup.
//!
//! Console output always; a daily-rolling file when a log directory is given.
//! The returned guard must be held for the lifetime of the process or
//! buffered file lines are lost.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "relaygate.log";

struct UtcTimer;

impl fmt::time::FormatTime for UtcTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}

/// Build the filter: `RUST_LOG` wins, then `default_level`, then `info`.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the file writer guard when file
/// output is enabled.
pub fn init_logger(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console_layer = fmt::Layer::new().with_target(false).with_level(true).with_timer(UtcTimer);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Failed to create log directory {}: {}", dir.display(), e);
                (None, None)
            } else {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::Layer::new()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTimer);
                (Some(layer), Some(guard))
            }
        },
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            file = log_dir.map(|d| d.display().to_string()).unwrap_or_default(),
            "Log system initialized"
        );
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_falls_back() {
        // Only meaningful when RUST_LOG is unset; either way it must not panic.
        let filter = build_filter("[[[not a directive");
        assert!(!filter.to_string().is_empty());
    }
}
