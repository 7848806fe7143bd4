//! lotctl - batch ledger operator CLI

use anyhow::Result;
use clap::Parser;
use lotctl::{Cli, logger};

fn main() -> Result<()> {
    // 先加载 .env，clap 的 env 回退才能读到
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    logger::init_logger(&cli.log_level, cli.log_json, cli.log_dir.as_deref());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(lotctl::run(cli))
}
