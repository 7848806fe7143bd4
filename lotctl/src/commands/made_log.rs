//! Made-log command - production events in a date range.

use super::{print_json, qty};
use crate::OutputFormat;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Args;
use ledger_client::FactorySession;
use shared::models::MadeLogRow;

/// Days covered when no start date is given
const DEFAULT_SPAN_DAYS: i64 = 30;

/// Arguments for the made-log command.
#[derive(Debug, Args)]
pub struct MadeLogArgs {
    /// First manufacture date (yyyy-mm-dd); defaults to 30 days before the end.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last manufacture date (yyyy-mm-dd); defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl MadeLogArgs {
    /// Inclusive range, resolved against `today`
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or_else(|| end - Duration::days(DEFAULT_SPAN_DAYS));
        (start, end)
    }
}

/// Execute the made-log command.
pub async fn execute(args: MadeLogArgs, session: &FactorySession, format: OutputFormat) -> Result<()> {
    let (start, end) = args.range(shared::util::today());
    if start > end {
        anyhow::bail!("Start date {} is after end date {}", start, end);
    }
    let rows = session
        .made_log(start, end)
        .await
        .context("Failed to load made log")?;

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No production between {} and {}", start, end);
            }
            for row in &rows {
                println!("{}", row_line(row));
            }
            Ok(())
        }
    }
}

fn row_line(row: &MadeLogRow) -> String {
    let leftover = row
        .leftover_grams
        .filter(|g| *g > 0.0)
        .map(|g| format!(", leftover {} g", qty(g)))
        .unwrap_or_default();
    let status = match row.status {
        shared::models::MadeLogStatus::Completed => "製造完了",
        shared::models::MadeLogStatus::FullyUsed => "全量使用",
    };
    format!(
        "{} {:<23} {} {} packs / {} g{} [{}]",
        row.manufactured_at,
        row.lot_id,
        if row.flavor_name.is_empty() { &row.flavor_id } else { &row.flavor_name },
        qty(row.produced_packs.unwrap_or(0.0)),
        qty(row.produced_grams.unwrap_or(0.0)),
        leftover,
        status
    )
}
