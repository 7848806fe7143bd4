//! Subcommand implementations

pub mod inventory;
pub mod made_log;
pub mod next_lot;
pub mod orders;

use anyhow::Result;
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Whole numbers print without decimals
fn qty(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
