//! Shared types for the batch ledger
//!
//! Wire rows exchanged with the external ledger, the error system, and the
//! pure reconciliation core: quantity conversion, lot identifiers, order and
//! storage aggregation, status derivation, masters lookup tables and the
//! mutation request types submitted by `ledger-client`.
//!
//! Nothing in this crate performs I/O. Every derivation is a function over
//! an immutable snapshot of rows and may be recomputed at any time.

pub mod action;
pub mod error;
pub mod lot;
pub mod masters;
pub mod models;
pub mod order;
pub mod quantity;
pub mod storage;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use lot::{LotId, SequenceCounter};
pub use masters::{MastersAvailability, MastersIndex};
pub use order::{LotStatus, Order, OrderLine, UseType};
pub use storage::{LotGroup, StorageAggregateEntry};
