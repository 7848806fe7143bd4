//! Inventory command - net stock per lot.

use super::{print_json, qty};
use crate::OutputFormat;
use anyhow::{Context, Result};
use clap::Args;
use ledger_client::FactorySession;
use shared::storage::{LotGroup, StorageAggregateEntry};

/// Arguments for the inventory command.
#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Nest split-child lots under their parent lot.
    #[arg(long, short = 'g')]
    pub grouped: bool,
}

/// Execute the inventory command.
pub async fn execute(args: InventoryArgs, session: &FactorySession, format: OutputFormat) -> Result<()> {
    if args.grouped {
        let groups = session
            .inventory_groups()
            .await
            .context("Failed to load inventory")?;
        return match format {
            OutputFormat::Json => print_json(&groups),
            OutputFormat::Text => {
                if groups.is_empty() {
                    println!("No stock held");
                }
                for group in &groups {
                    println!("{}", group_line(group));
                    for child in &group.children {
                        println!("  {}", entry_line(child));
                    }
                }
                Ok(())
            }
        };
    }

    let entries = session.inventory().await.context("Failed to load inventory")?;
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No stock held");
            }
            for entry in &entries {
                println!("{}", entry_line(entry));
            }
            Ok(())
        }
    }
}

fn packs_text(packs: Option<f64>) -> String {
    packs.map(|p| format!(" (~{} packs)", qty(p))).unwrap_or_default()
}

fn entry_line(entry: &StorageAggregateEntry) -> String {
    format!(
        "{:<23} {:<6} {} g{} @ {}",
        entry.lot_id,
        entry.flavor_id,
        qty(entry.grams),
        packs_text(entry.packs_equiv),
        entry.locations.join(", ")
    )
}

fn group_line(group: &LotGroup) -> String {
    format!(
        "{:<23} {:<6} {} g{} @ {}",
        group.parent_lot_id,
        group.flavor_id,
        qty(group.total_grams()),
        packs_text(group.total_packs_equiv()),
        group.locations().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lot_id: &str, grams: f64, location: &str) -> StorageAggregateEntry {
        StorageAggregateEntry {
            lot_id: lot_id.to_string(),
            factory_code: "GT".to_string(),
            flavor_id: "F1".to_string(),
            grams,
            packs_equiv: Some(grams / 850.0),
            locations: vec![location.to_string()],
            manufactured_at: "2024-05-02".to_string(),
        }
    }

    #[test]
    fn test_group_line_sums_family() {
        let group = LotGroup {
            parent_lot_id: "GT-20240501-001".to_string(),
            flavor_id: "F1".to_string(),
            parent: Some(entry("GT-20240501-001", 850.0, "冷蔵庫")),
            children: vec![entry("GT-20240501-001-01", 1700.0, "冷凍庫")],
        };
        let text = group_line(&group);
        assert!(text.contains("2550 g (~3 packs)"));
        assert!(text.ends_with("冷蔵庫, 冷凍庫"));
    }
}
