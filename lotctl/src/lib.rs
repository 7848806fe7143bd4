//! # lotctl
//!
//! Operator CLI over the batch ledger.
//!
//! ## Commands
//!
//! - `lotctl orders` - orders with their derived lot status
//! - `lotctl inventory` - net inventory per lot, optionally grouped by parent
//! - `lotctl made-log` - production events in a date range
//! - `lotctl next-lot` - preview the next lot id for a date
//!
//! ## Configuration
//!
//! Flags fall back to environment variables (a `.env` file is loaded first):
//!
//! - `LEDGER_BASE_URL` - ledger endpoint
//! - `LEDGER_API_KEY` - API key
//! - `LEDGER_TIMEOUT_MS` - bounded wait per call (default 90000)
//! - `LOTCTL_FACTORY` - factory code

pub mod commands;
pub mod logger;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_client::config::DEFAULT_TIMEOUT_MS;
use ledger_client::{FactorySession, HttpLedger, LedgerConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Batch ledger command-line interface.
#[derive(Debug, Parser)]
#[command(name = "lotctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Ledger endpoint URL.
    #[arg(long, env = "LEDGER_BASE_URL")]
    pub base_url: String,

    /// Ledger API key.
    #[arg(long, env = "LEDGER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bounded wait per ledger call, in milliseconds.
    #[arg(long, env = "LEDGER_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Factory code.
    #[arg(long, short, env = "LOTCTL_FACTORY")]
    pub factory: String,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Log level (overridden by RUST_LOG).
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Write logs as JSON.
    #[arg(long)]
    pub log_json: bool,

    /// Directory for daily-rolling log files; logs go to stderr when unset.
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn ledger_config(&self) -> LedgerConfig {
        let config = LedgerConfig::new(self.base_url.clone()).with_timeout_ms(self.timeout_ms);
        match self.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List orders with their lot status.
    Orders(commands::orders::OrdersArgs),
    /// Show net inventory.
    Inventory(commands::inventory::InventoryArgs),
    /// Show production events.
    MadeLog(commands::made_log::MadeLogArgs),
    /// Preview the next lot id.
    NextLot(commands::next_lot::NextLotArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Connect to the ledger and run the selected command
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.ledger_config();
    let ledger = HttpLedger::new(&config).context("Failed to create ledger client")?;
    tracing::debug!(base_url = %ledger.base_url(), factory = %cli.factory, "ledger client ready");
    let session = FactorySession::new(Arc::new(ledger), cli.factory.clone(), config.timeout);

    match cli.command {
        Commands::Orders(args) => commands::orders::execute(args, &session, cli.format).await,
        Commands::Inventory(args) => commands::inventory::execute(args, &session, cli.format).await,
        Commands::MadeLog(args) => commands::made_log::execute(args, &session, cli.format).await,
        Commands::NextLot(args) => commands::next_lot::execute(args, &session, cli.format).await,
    }
}
