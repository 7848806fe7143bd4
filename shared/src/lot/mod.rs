//! Lot identifiers
//!
//! A parent lot is `FACTORY-YYYYMMDD-SEQ`, with `SEQ` a 1-based counter per
//! factory and day, zero-padded to 3 digits. A split-child lot appends
//! `-NN`, a 1-based counter scoped to its parent.
//!
//! The parent/child relation is structural: a child's parent is its own id
//! with the last segment removed. It is never stored.

mod id;
mod sequence;

pub use id::{LotId, date_segment, family_root, format_lot_id, is_child_lot, parent_lot_id};
pub use sequence::{SequenceCounter, next_child_sequence, next_sequence};
