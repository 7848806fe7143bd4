//! Orders
//!
//! - [`aggregate_orders`]: flat ledger rows to [`Order`]s with one or more lines
//! - [`derive_status`]: lifecycle [`LotStatus`] of an order against current inventory
//!
//! Both are pure and cheap enough to recompute on every fetch.

pub mod aggregate;
pub mod status;
pub mod types;

// Re-exports
pub use aggregate::aggregate_orders;
pub use status::{LotStatus, derive_status, derive_statuses, status_for, stored_grams_by_lot};
pub use types::{Order, OrderLine, UseType};
