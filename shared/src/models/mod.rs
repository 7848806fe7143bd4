//! Wire rows exchanged with the external ledger
//!
//! The ledger is spreadsheet-backed, so cells arrive loosely typed. Every
//! numeric or boolean field goes through [`lenient`] and is coerced to a
//! sane default when absent or unparseable.

pub mod lenient;
pub mod made_log;
pub mod masters;
pub mod order_row;
pub mod storage_row;

// Re-exports
pub use made_log::{MadeLogQuery, MadeLogResponse, MadeLogRow, MadeLogStatus};
pub use masters::{
    FactoryRow, FlavorRow, LocationRow, Masters, OemPartnerRow, RecipeRow, ReporterRow,
    UseFlavorRow, UseRow,
};
pub use order_row::OrderRow;
pub use storage_row::StorageAggRow;
