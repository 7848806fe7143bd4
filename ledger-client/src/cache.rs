//! Per-factory row cache
//!
//! Holds the last fetched order and storage rows. Projections are never
//! cached; callers rebuild them from the row snapshot on every read.

use parking_lot::RwLock;
use shared::models::{OrderRow, StorageAggRow};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
struct FactoryRows {
    orders: Option<Arc<Vec<OrderRow>>>,
    storage: Option<Arc<Vec<StorageAggRow>>>,
}

/// Last fetched rows, keyed by factory code
#[derive(Debug, Default)]
pub struct RowCache {
    factories: RwLock<HashMap<String, FactoryRows>>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self, factory_code: &str) -> Option<Arc<Vec<OrderRow>>> {
        self.factories
            .read()
            .get(factory_code)
            .and_then(|f| f.orders.clone())
    }

    pub fn storage(&self, factory_code: &str) -> Option<Arc<Vec<StorageAggRow>>> {
        self.factories
            .read()
            .get(factory_code)
            .and_then(|f| f.storage.clone())
    }

    pub fn put_orders(&self, factory_code: &str, rows: Vec<OrderRow>) -> Arc<Vec<OrderRow>> {
        let rows = Arc::new(rows);
        self.factories
            .write()
            .entry(factory_code.to_string())
            .or_default()
            .orders = Some(rows.clone());
        rows
    }

    pub fn put_storage(&self, factory_code: &str, rows: Vec<StorageAggRow>) -> Arc<Vec<StorageAggRow>> {
        let rows = Arc::new(rows);
        self.factories
            .write()
            .entry(factory_code.to_string())
            .or_default()
            .storage = Some(rows.clone());
        rows
    }

    /// Drop both row sets of a factory; the next read re-fetches
    pub fn invalidate(&self, factory_code: &str) {
        if self.factories.write().remove(factory_code).is_some() {
            tracing::debug!(factory = %factory_code, "row cache invalidated");
        }
    }
}
