//! Relaygate Server - Headless Daemon
//!
//! A pure Rust HTTP server that:
//! - Rate-limits the admin API on /api/* (Redis-backed when configured)
//! - Explains pool exhaustion on /api/pool/diagnostics
//! - Recovers failed accounts automatically with bounded probe retries
//! - Exposes Prometheus metrics on /metrics
//!
//! Access via: http://localhost:8046

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

mod api;
mod cli;
mod router;
mod server_utils;
mod state;

#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands, ConfigCommands};
use relaygate_core::modules::{config, logger, InMemoryAccountRepository};
use relaygate_core::proxy::health::diagnose;
use relaygate_core::proxy::prometheus;
use relaygate_core::proxy::rate_limit::counter_from_config;
use relaygate_core::proxy::recovery::HttpUpstreamCheck;
use relaygate_core::AccountRepository;
use relaygate_types::{GatewayConfig, Platform};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { command, config: config_path, accounts, log_level, log_dir } = Cli::parse();

    let _log_guard = logger::init_logger(&log_level, log_dir.as_deref());

    let config_path = config_path
        .or_else(config::default_config_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory, pass --config"))?;

    match command {
        None => serve(&config_path, accounts.as_deref(), None).await,
        Some(Commands::Serve { port }) => serve(&config_path, accounts.as_deref(), port).await,
        Some(Commands::Diagnose { platform, json }) => {
            run_diagnose(&config_path, accounts.as_deref(), platform.as_deref(), json).await
        },
        Some(Commands::Config(cmd)) => run_config(cmd, &config_path),
    }
}

async fn serve(config_path: &Path, accounts: Option<&Path>, port: Option<u16>) -> Result<()> {
    let mut config = config::load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("🚀 Relaygate starting on {}...", config.server.socket_addr());

    if prometheus::init_metrics().is_none() {
        warn!("⚠️ Metrics recorder unavailable, /metrics will be empty");
    }

    let repository = Arc::new(load_accounts(accounts)?);
    let counter = counter_from_config(&config.counter_store)?;
    let upstream = Arc::new(HttpUpstreamCheck::new(config.probe.clone())?);
    let state = AppState::new(config.clone(), repository, counter, upstream);

    info!("✅ Application state initialized");
    info!("📊 {} accounts loaded", state.repository().len());

    let app = router::build_router(state.clone());
    let listener = server_utils::create_listener(&config.server.host, config.server.port).await?;

    info!("🔌 API available at http://{}/api/", config.server.socket_addr());
    info!("📈 Metrics at http://{}/metrics", config.server.socket_addr());

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(server_utils::shutdown_signal())
        .await?;

    state.shutdown();
    info!("👋 Relaygate stopped");
    Ok(())
}

fn load_accounts(path: Option<&Path>) -> Result<InMemoryAccountRepository> {
    match path {
        Some(path) => Ok(InMemoryAccountRepository::from_json_file(path)?),
        None => {
            warn!("⚠️ No accounts file given, starting with an empty pool");
            Ok(InMemoryAccountRepository::new())
        },
    }
}

async fn run_diagnose(
    config_path: &Path,
    accounts: Option<&Path>,
    platform: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = config::load_config(config_path)?;
    let platform = platform.map(parse_platform).transpose()?;
    let path = accounts.ok_or_else(|| anyhow::anyhow!("diagnose needs --accounts"))?;

    let accounts = InMemoryAccountRepository::from_json_file(path)?.list().await?;
    let now = Utc::now();
    let stats = diagnose(&accounts, platform, now, &config.window_bands);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats.describe(now));
    }
    Ok(())
}

fn run_config(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = config::load_config(config_path)?;
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        },
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", config_path.display());
            }
            config::save_config(config_path, &GatewayConfig::default())?;
            println!("Wrote default configuration to {}", config_path.display());
        },
    }
    Ok(())
}

fn parse_platform(raw: &str) -> Result<Platform> {
    raw.parse::<Platform>().map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform() {
        assert_eq!(parse_platform("Claude").unwrap(), Platform::Claude);
        assert_eq!(parse_platform(" openai ").unwrap(), Platform::OpenAi);
        assert_eq!(parse_platform("anthropic").unwrap(), Platform::Claude);
        let err = parse_platform("bedrock").unwrap_err();
        assert!(err.to_string().contains("unknown platform"));
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("relaygate").join("config.json");

        run_config(ConfigCommands::Init { force: false }, &path).unwrap();
        assert!(path.exists());
        assert!(run_config(ConfigCommands::Init { force: false }, &path).is_err());
        run_config(ConfigCommands::Init { force: true }, &path).unwrap();
    }

    #[test]
    fn test_load_accounts_without_file_is_empty() {
        assert!(load_accounts(None).unwrap().is_empty());
        assert!(load_accounts(Some(Path::new("/nonexistent/accounts.json"))).is_err());
    }
}
