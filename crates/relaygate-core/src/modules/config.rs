//! Gateway configuration loading and persistence.

use relaygate_types::{ConfigError, GatewayConfig};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;

const CONFIG_DIR: &str = "relaygate";
const CONFIG_FILE: &str = "config.json";

pub const ENV_PORT: &str = "RELAYGATE_PORT";
pub const ENV_REDIS_URL: &str = "RELAYGATE_REDIS_URL";

/// Default config location: `<config_dir>/relaygate/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the gateway configuration.
///
/// A missing file yields defaults. Environment overrides are applied before
/// validation.
pub fn load_config(path: &Path) -> AppResult<GatewayConfig> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::from_read_error(&e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?
    } else {
        tracing::info!("Config file {} not found, using defaults", path.display());
        GatewayConfig::default()
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.check()?;
    Ok(config)
}

/// Apply `RELAYGATE_*` overrides using `lookup` as the variable source.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(ENV_PORT, format!("not a port number: {port}")))?;
    }

    if let Some(url) = lookup(ENV_REDIS_URL) {
        let url = url.trim();
        config.counter_store.redis_url = if url.is_empty() { None } else { Some(url.to_string()) };
    }

    Ok(())
}

/// Save the configuration atomically (temp file + rename).
pub fn save_config(path: &Path, config: &GatewayConfig) -> AppResult<()> {
    config.check()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::from_write_error(&e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(config)?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::from_write_error(&e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::from_write_error(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use relaygate_types::FailureMode;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.recovery.max_attempts, 3);
        assert_eq!(config.counter_store.key_prefix, "rate_limit:");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = GatewayConfig::default();
        config.recovery.retry_delay_secs = 5;
        config.rate_limits[0].failure_mode = FailureMode::FailClose;
        save_config(&path, &config).unwrap();

        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.recovery.retry_delay_secs, 5);
        assert_eq!(loaded.rate_limits[0].failure_mode, FailureMode::FailClose);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_config(&path), Err(AppError::Config(ConfigError::ParseError { .. }))));
    }

    #[test]
    fn test_unreadable_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory exists but cannot be read as a file.
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::ReadError { .. })), "{err}");
        assert!(err.to_string().contains("Config read error"));
    }

    #[test]
    fn test_overrides() {
        let mut config = GatewayConfig::default();
        apply_overrides(&mut config, |key| match key {
            ENV_PORT => Some("9100".to_string()),
            ENV_REDIS_URL => Some("redis://127.0.0.1:6379/1".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.counter_store.redis_url.as_deref(), Some("redis://127.0.0.1:6379/1"));

        let err = apply_overrides(&mut config, |key| {
            (key == ENV_PORT).then(|| "eighty".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn test_empty_redis_override_selects_memory_store() {
        let mut config = GatewayConfig::default();
        config.counter_store.redis_url = Some("redis://x".to_string());
        apply_overrides(&mut config, |key| (key == ENV_REDIS_URL).then(String::new)).unwrap();
        assert!(config.counter_store.redis_url.is_none());
    }
}
