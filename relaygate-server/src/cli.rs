use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relaygate",
    about = "Relaygate - admission control and account recovery daemon",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "RELAYGATE_CONFIG", help = "Path to config.json")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "RELAYGATE_ACCOUNTS", help = "Path to accounts JSON file")]
    pub accounts: Option<PathBuf>,

    #[arg(short, long, env = "RELAYGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "RELAYGATE_LOG_DIR", help = "Also write daily-rolling logs here")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the server (default if no command specified)")]
    Serve {
        #[arg(short, long, help = "Override the configured port")]
        port: Option<u16>,
    },

    #[command(about = "Explain which accounts are schedulable right now")]
    Diagnose {
        #[arg(long, help = "Only consider one platform (claude, openai, gemini, antigravity)")]
        platform: Option<String>,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(subcommand, about = "View and initialize configuration")]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration")]
    Show,

    #[command(about = "Write the default configuration file")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}
