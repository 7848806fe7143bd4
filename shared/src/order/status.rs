//! Lifecycle status of an order, derived on demand

use super::types::Order;
use crate::lot::family_root;
use crate::storage::{GRAMS_EPSILON, StorageAggregateEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status; never stored, always recomputed from rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    /// 発注済 - nothing produced yet
    Ordered,
    /// 製造中 - partially produced
    InProgress,
    /// 製造完了 - requested amount produced
    Completed,
    /// 保管中 - leftover inventory held for the lot or its split children
    Stored,
    /// 使用済 - archived, fully produced and nothing left in storage
    FullyConsumed,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ORDERED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Stored => "STORED",
            Self::FullyConsumed => "FULLY_CONSUMED",
        }
    }

    /// Whether the order still needs production
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Ordered | Self::InProgress)
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net grams held per family root (a parent lot plus its split children)
pub fn stored_grams_by_lot(storage: &[StorageAggregateEntry]) -> HashMap<&str, f64> {
    let mut held: HashMap<&str, f64> = HashMap::new();
    for entry in storage {
        if entry.grams > GRAMS_EPSILON {
            *held.entry(family_root(&entry.lot_id)).or_insert(0.0) += entry.grams;
        }
    }
    held
}

/// Status from the order and the grams already looked up for its lot
pub fn status_for(order: &Order, stored_grams: f64) -> LotStatus {
    if stored_grams > GRAMS_EPSILON {
        LotStatus::Stored
    } else if order.archived && order.is_fully_produced() {
        LotStatus::FullyConsumed
    } else if order.is_fully_produced() {
        LotStatus::Completed
    } else if order.has_progress() {
        LotStatus::InProgress
    } else {
        LotStatus::Ordered
    }
}

/// Derive the status of one order.
///
/// `storage` is the current inventory; only entries for the order's lot or
/// its split children are considered.
pub fn derive_status(order: &Order, storage: &[StorageAggregateEntry]) -> LotStatus {
    let stored = stored_grams_by_lot(storage)
        .get(order.lot_id.as_str())
        .copied()
        .unwrap_or(0.0);
    status_for(order, stored)
}

/// Derive the status of every order against one inventory snapshot
pub fn derive_statuses<'a>(
    orders: &'a [Order],
    storage: &[StorageAggregateEntry],
) -> Vec<(&'a Order, LotStatus)> {
    let held = stored_grams_by_lot(storage);
    orders
        .iter()
        .map(|order| {
            let stored = held.get(order.lot_id.as_str()).copied().unwrap_or(0.0);
            (order, status_for(order, stored))
        })
        .collect()
}
