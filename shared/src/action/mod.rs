//! Mutation requests
//!
//! Every state change is a [`Mutation`] posted to one ledger path and
//! wrapped in a [`MutationEnvelope`] carrying its `request_id`:
//!
//! | Path | Mutation |
//! |------|----------|
//! | `action` | KEEP / USE / WASTE / MADE_SPLIT against a lot |
//! | `orders-create` | new order with a client-minted lot id |
//! | `onsite-make` | unscheduled production, synthesizing an archived order |

pub mod draft;
pub mod payload;
pub mod request;

// Re-exports
pub use draft::{CreateOrderDraft, MadeReport, OnsiteMakeDraft, OrderLineDraft, ReportMode};
pub use payload::{
    ActionType, KeepPayload, Leftover, MadePayload, MadeResult, MaterialLine, UsePayload,
    WastePayload,
};
pub use request::{
    ActionBody, ActionTarget, CreateOrderLine, CreateOrderRequest, Mutation, MutationAck,
    MutationEnvelope, OnsiteMakeRequest,
};
