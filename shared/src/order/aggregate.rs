//! Flat order rows -> orders

use super::types::{Order, OrderLine, UseType};
use crate::models::OrderRow;
use std::collections::HashMap;

/// Non-finite or negative cells count as 0
fn amount(cell: Option<f64>) -> f64 {
    match cell {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn non_blank(cell: &Option<String>) -> Option<String> {
    cell.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<&OrderRow> for OrderLine {
    fn from(row: &OrderRow) -> Self {
        let packs = amount(row.packs);
        let made_packs = amount(row.made_packs);
        let packs_remaining = match row.packs_remaining {
            Some(v) if v.is_finite() => v.max(0.0),
            _ => (packs - made_packs).max(0.0),
        };
        Self {
            flavor_id: row.flavor_id.trim().to_string(),
            use_type: row
                .use_type
                .as_deref()
                .map(UseType::from_label)
                .unwrap_or_default(),
            use_code: non_blank(&row.use_code),
            packs,
            required_grams: amount(row.required_grams),
            made_packs,
            made_grams: amount(row.made_grams),
            packs_remaining,
            oem_partner: non_blank(&row.oem_partner),
        }
    }
}

/// Rows are grouped by `order_id`, falling back to `lot_id` when the id cell is blank
fn order_key(row: &OrderRow) -> Option<&str> {
    [row.order_id.trim(), row.lot_id.trim()]
        .into_iter()
        .find(|k| !k.is_empty())
}

/// Merge flat order-line rows into orders.
///
/// Orders come out in the order their first row was seen; lines keep row
/// order. Identity fields come from the first row that carries them, while
/// `archived` and `deadline_at` follow the last row seen (a blank deadline
/// cell on a later line does not erase an earlier one). Rows with neither an
/// order id nor a lot id are skipped.
pub fn aggregate_orders(rows: &[OrderRow]) -> Vec<Order> {
    let mut orders: Vec<Order> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(key) = order_key(row) else {
            tracing::debug!(factory = %row.factory_code, "order row without order or lot id skipped");
            continue;
        };

        let pos = *index.entry(key.to_string()).or_insert_with(|| {
            orders.push(Order {
                order_id: key.to_string(),
                lot_id: String::new(),
                factory_code: String::new(),
                ordered_at: String::new(),
                deadline_at: None,
                lines: Vec::new(),
                archived: false,
            });
            orders.len() - 1
        });
        let order = &mut orders[pos];

        if order.lot_id.is_empty() {
            order.lot_id = row.lot_id.trim().to_string();
        }
        if order.factory_code.is_empty() {
            order.factory_code = row.factory_code.trim().to_string();
        }
        if order.ordered_at.is_empty() {
            order.ordered_at = row.ordered_at.trim().to_string();
        }
        if let Some(deadline) = non_blank(&row.deadline_at) {
            order.deadline_at = Some(deadline);
        }
        order.archived = row.archived.unwrap_or(false);
        order.lines.push(OrderLine::from(row));
    }

    orders
}
