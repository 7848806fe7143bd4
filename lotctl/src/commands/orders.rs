//! Orders command - orders with their derived lot status.

use super::{print_json, qty};
use crate::OutputFormat;
use anyhow::{Context, Result};
use clap::Args;
use ledger_client::FactorySession;
use shared::order::{LotStatus, Order};

/// Arguments for the orders command.
#[derive(Debug, Args)]
pub struct OrdersArgs {
    /// Only orders that are not archived.
    #[arg(long)]
    pub open: bool,
}

#[derive(serde::Serialize)]
struct OrderStatusView<'a> {
    #[serde(flatten)]
    order: &'a Order,
    status: LotStatus,
}

/// Execute the orders command.
pub async fn execute(args: OrdersArgs, session: &FactorySession, format: OutputFormat) -> Result<()> {
    let mut statuses = session
        .order_statuses()
        .await
        .context("Failed to load orders")?;
    if args.open {
        statuses.retain(|(order, _)| !order.archived);
    }

    match format {
        OutputFormat::Json => {
            let views: Vec<_> = statuses
                .iter()
                .map(|(order, status)| OrderStatusView {
                    order,
                    status: *status,
                })
                .collect();
            print_json(&views)
        }
        OutputFormat::Text => {
            if statuses.is_empty() {
                println!("No orders found");
                return Ok(());
            }
            for (order, status) in &statuses {
                println!("{}", order_line(order, *status));
            }
            Ok(())
        }
    }
}

fn order_line(order: &Order, status: LotStatus) -> String {
    let flavors: Vec<&str> = order.lines.iter().map(|l| l.flavor_id.as_str()).collect();
    let progress = if order.is_oem() {
        format!(
            "{}/{} g",
            qty(order.lines.iter().map(|l| l.made_grams).sum()),
            qty(order.total_required_grams())
        )
    } else {
        format!(
            "{}/{} packs, {} remaining",
            qty(order.total_made_packs()),
            qty(order.total_packs()),
            qty(order.total_packs_remaining())
        )
    };
    let deadline = order
        .deadline_at
        .as_deref()
        .map(|d| format!(" due {}", d))
        .unwrap_or_default();
    format!(
        "{:<20} {:<15} {:<12} {}{}",
        order.lot_id,
        status.as_str(),
        flavors.join(","),
        progress,
        deadline
    )
}
