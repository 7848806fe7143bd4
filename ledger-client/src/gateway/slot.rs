//! Per-action submission state
//!
//! One `ActionSlot` belongs to one logical action instance (one lot's
//! "use" form, one order's made report, ...). It holds the request id of
//! the current attempt until that attempt succeeds, and a busy flag that
//! refuses re-entrant submission.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct SlotState {
    request_id: Option<String>,
    busy: bool,
}

/// Request id holder and single-flight gate for one logical action
#[derive(Debug, Clone, Default)]
pub struct ActionSlot {
    state: Arc<Mutex<SlotState>>,
}

impl ActionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request id held for the next retry, if any
    pub fn held_request_id(&self) -> Option<String> {
        self.state.lock().request_id.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Forget the held request id; the next submission starts a new attempt
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if !state.busy {
            state.request_id = None;
        }
    }

    /// Mark the slot busy and return the attempt's request id.
    ///
    /// Reuses the held id when a previous attempt failed. Returns
    /// `Err(request_id)` while another submission is in flight.
    pub(crate) fn begin(&self) -> Result<InFlight, String> {
        let mut state = self.state.lock();
        let request_id = state
            .request_id
            .get_or_insert_with(shared::util::new_request_id)
            .clone();
        if state.busy {
            return Err(request_id);
        }
        state.busy = true;
        Ok(InFlight {
            slot: self.clone(),
            request_id,
        })
    }
}

/// Guard for a submission in flight; clears the busy flag on drop
#[derive(Debug)]
pub(crate) struct InFlight {
    slot: ActionSlot,
    pub(crate) request_id: String,
}

impl InFlight {
    /// The attempt took effect; release the request id
    pub(crate) fn succeed(self) {
        self.slot.state.lock().request_id = None;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.slot.state.lock().busy = false;
    }
}
