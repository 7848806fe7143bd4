//! Next-lot command - preview the lot id the next order would get.

use super::print_json;
use crate::OutputFormat;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ledger_client::FactorySession;

/// Arguments for the next-lot command.
#[derive(Debug, Args)]
pub struct NextLotArgs {
    /// Order date (yyyy-mm-dd); defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Execute the next-lot command.
///
/// The value is computed from the orders the ledger holds right now; another
/// client may claim it first.
pub async fn execute(args: NextLotArgs, session: &FactorySession, format: OutputFormat) -> Result<()> {
    let date = args.date.unwrap_or_else(shared::util::today);
    let lot = session
        .mint_lot_id(date)
        .await
        .context("Failed to read orders")?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "factory_code": session.factory_code(),
            "date": date,
            "lot_id": lot.to_string(),
        })),
        OutputFormat::Text => {
            println!("{}", lot);
            Ok(())
        }
    }
}
