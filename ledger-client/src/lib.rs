//! Ledger Client - access to the external batch ledger
//!
//! Reads order, storage and masters rows from the ledger and submits
//! mutations through an idempotent, single-flight gateway.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod ledger;
pub mod memory;
pub mod session;

pub use cache::RowCache;
pub use config::LedgerConfig;
pub use error::{ClientError, ClientResult, GatewayError, GatewayResult};
pub use gateway::{ActionSlot, FactoryRows, MutationGateway, Submitted};
pub use http::HttpLedger;
pub use ledger::Ledger;
pub use memory::{Fault, InMemoryLedger};
pub use session::FactorySession;
