//! In-process ledger
//!
//! Behaves like the external ledger: it dedupes by `request_id`, refuses a
//! lot id that already exists, applies `MADE_SPLIT` to the order line and
//! archives orders once fully produced. Used by tests and offline runs.
//! Faults can be queued to simulate lost answers and outages.

use crate::ledger::Ledger;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::ErrorCode;
use shared::action::{
    ActionBody, CreateOrderRequest, Leftover, MadePayload, MadeResult, Mutation, MutationAck,
    MutationEnvelope, OnsiteMakeRequest,
};
use shared::lot::{LotId, next_child_sequence, parent_lot_id};
use shared::models::{MadeLogQuery, MadeLogRow, MadeLogStatus, Masters, OrderRow, StorageAggRow};
use shared::storage::GRAMS_EPSILON;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Fault applied to the next submission
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Fail without applying anything
    Unavailable,
    /// Apply, then lose the answer (at-least-once delivery)
    TimeoutAfterApply,
    /// Wait before handling the submission
    Delay(Duration),
}

/// A ledger-side refusal
type Refusal = (ErrorCode, String);

#[derive(Debug, Default)]
struct LedgerState {
    masters: Masters,
    orders: Vec<OrderRow>,
    /// Signed storage events, in arrival order
    storage: Vec<StorageAggRow>,
    made_log: Vec<MadeLogRow>,
    /// Child lot ids of recorded split events
    split_events: Vec<String>,
    acks: HashMap<String, MutationAck>,
    effects: usize,
    next_order_no: u32,
    next_action_no: u32,
}

/// Authoritative in-memory ledger
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    faults: Mutex<VecDeque<Fault>>,
}

impl InMemoryLedger {
    pub fn new(masters: Masters) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                masters,
                ..Default::default()
            }),
            faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Seed existing order rows (e.g. orders created by another client)
    pub fn seed_orders(&self, rows: impl IntoIterator<Item = OrderRow>) {
        self.state.lock().orders.extend(rows);
    }

    /// Seed raw storage events
    pub fn seed_storage(&self, rows: impl IntoIterator<Item = StorageAggRow>) {
        self.state.lock().storage.extend(rows);
    }

    /// Queue a fault for the next submission; faults are consumed in order
    pub fn inject(&self, fault: Fault) {
        self.faults.lock().push_back(fault);
    }

    /// Number of mutations that changed state
    pub fn effects(&self) -> usize {
        self.state.lock().effects
    }

    pub fn order_rows(&self) -> Vec<OrderRow> {
        self.state.lock().orders.clone()
    }

    pub fn storage_events(&self) -> Vec<StorageAggRow> {
        self.state.lock().storage.clone()
    }

    /// Handle one envelope under the lock; refusals are not remembered
    fn apply(&self, envelope: &MutationEnvelope) -> Result<MutationAck, Refusal> {
        let mut state = self.state.lock();
        if let Some(ack) = state.acks.get(&envelope.request_id) {
            return Ok(ack.as_duplicate());
        }

        let ack = match &envelope.mutation {
            Mutation::CreateOrder(req) => state.create_order(req)?,
            Mutation::OnsiteMake(req) => state.onsite_make(req)?,
            Mutation::Action(body) => state.action(body)?,
        };
        state.effects += 1;
        state.acks.insert(envelope.request_id.clone(), ack.clone());
        Ok(ack)
    }
}

fn refuse<T>(code: ErrorCode, message: impl Into<String>) -> Result<T, Refusal> {
    Err((code, message.into()))
}

/// Non-finite or negative cells count as 0
fn cell(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

fn row_fully_produced(row: &OrderRow) -> bool {
    let packs = cell(row.packs);
    let oem = row
        .use_type
        .as_deref()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("oem"));
    if !oem && packs > 0.0 {
        cell(row.made_packs) >= packs
    } else {
        let required = cell(row.required_grams);
        let made = cell(row.made_grams);
        if required > 0.0 { made >= required } else { made > 0.0 }
    }
}

impl LedgerState {
    fn lot_exists(&self, lot_id: &str) -> bool {
        self.orders.iter().any(|r| r.lot_id == lot_id)
    }

    fn next_order_id(&mut self) -> String {
        self.next_order_no += 1;
        format!("ORD-{:05}", self.next_order_no)
    }

    fn next_action_id(&mut self) -> String {
        self.next_action_no += 1;
        format!("ACT-{:05}", self.next_action_no)
    }

    fn flavor_name(&self, flavor_id: &str) -> String {
        self.masters
            .flavors
            .iter()
            .find(|f| f.flavor_id == flavor_id)
            .map(|f| f.flavor_name.clone())
            .unwrap_or_default()
    }

    fn net_grams(&self, lot_id: &str) -> f64 {
        self.storage
            .iter()
            .filter(|r| r.lot_id == lot_id)
            .map(|r| cell_signed(r.grams))
            .sum()
    }

    fn record_storage(
        &mut self,
        factory_code: &str,
        lot_id: &str,
        flavor_id: &str,
        grams: f64,
        location: Option<&str>,
        manufactured_at: &str,
    ) {
        self.storage.push(StorageAggRow {
            lot_id: lot_id.to_string(),
            factory_code: factory_code.to_string(),
            flavor_id: flavor_id.to_string(),
            grams: Some(grams),
            packs_equiv: None,
            locations: location.map(|l| vec![l.to_string()]).unwrap_or_default(),
            manufactured_at: manufactured_at.to_string(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn record_made(
        &mut self,
        factory_code: &str,
        lot_id: &str,
        flavor_id: &str,
        manufactured_at: &str,
        grams: f64,
        packs: u32,
        result: MadeResult,
        leftover: Option<&Leftover>,
    ) {
        let action_id = self.next_action_id();
        let flavor_name = self.flavor_name(flavor_id);
        self.made_log.push(MadeLogRow {
            action_id,
            factory_code: factory_code.to_string(),
            lot_id: lot_id.to_string(),
            flavor_id: flavor_id.to_string(),
            flavor_name,
            manufactured_at: manufactured_at.to_string(),
            produced_grams: Some(grams),
            produced_packs: Some(f64::from(packs)),
            leftover_grams: leftover.map(|l| l.grams),
            status: match result {
                MadeResult::Extra => MadeLogStatus::Completed,
                MadeResult::Used => MadeLogStatus::FullyUsed,
            },
        });
        if let Some(leftover) = leftover {
            self.record_storage(
                factory_code,
                lot_id,
                flavor_id,
                leftover.grams,
                Some(&leftover.location),
                manufactured_at,
            );
        }
    }

    fn create_order(&mut self, req: &CreateOrderRequest) -> Result<MutationAck, Refusal> {
        if self.lot_exists(&req.lot_id) {
            return refuse(ErrorCode::LotIdConflict, format!("lot {} already exists", req.lot_id));
        }
        let order_id = self.next_order_id();
        for line in &req.lines {
            self.orders.push(OrderRow {
                order_id: order_id.clone(),
                lot_id: req.lot_id.clone(),
                factory_code: req.factory_code.clone(),
                ordered_at: req.ordered_at.clone(),
                deadline_at: req.deadline_at.clone(),
                flavor_id: line.flavor_id.clone(),
                use_type: Some(line.use_type.as_str().to_string()),
                use_code: line.use_code.clone(),
                packs: Some(f64::from(line.packs)),
                packs_remaining: Some(f64::from(line.packs)),
                made_packs: Some(0.0),
                made_grams: Some(0.0),
                required_grams: Some(line.required_grams),
                oem_partner: line.oem_partner.clone(),
                archived: Some(false),
            });
        }
        Ok(MutationAck::applied(Some(req.lot_id.clone())))
    }

    fn onsite_make(&mut self, req: &OnsiteMakeRequest) -> Result<MutationAck, Refusal> {
        let lot_id = &req.generated_lot_id;
        if self.lot_exists(lot_id) {
            return refuse(ErrorCode::LotIdConflict, format!("lot {} already exists", lot_id));
        }
        let order_id = self.next_order_id();
        self.orders.push(OrderRow {
            order_id,
            lot_id: lot_id.clone(),
            factory_code: req.factory_code.clone(),
            ordered_at: req.manufactured_at.clone(),
            deadline_at: None,
            flavor_id: req.flavor_id.clone(),
            use_type: Some(req.use_type.as_str().to_string()),
            use_code: Some(req.use_code.clone()),
            packs: Some(f64::from(req.packs)),
            packs_remaining: Some(0.0),
            made_packs: Some(f64::from(req.packs)),
            made_grams: Some(req.produced_grams),
            required_grams: Some(req.produced_grams),
            oem_partner: req.oem_partner.clone(),
            archived: Some(true),
        });
        self.record_made(
            &req.factory_code,
            lot_id,
            &req.flavor_id,
            &req.manufactured_at,
            req.produced_grams,
            req.packs,
            req.result,
            req.leftover.as_ref(),
        );
        Ok(MutationAck::applied(Some(lot_id.clone())))
    }

    fn action(&mut self, body: &ActionBody) -> Result<MutationAck, Refusal> {
        let lot_id = body.lot_id();
        let known = self.lot_exists(lot_id)
            || self.storage.iter().any(|r| r.lot_id == lot_id)
            || parent_lot_id(lot_id).is_some_and(|p| self.lot_exists(p));
        if !known {
            return refuse(ErrorCode::LotNotFound, format!("lot {} not found", lot_id));
        }

        match body {
            ActionBody::Keep(t) => {
                let p = &t.payload;
                self.record_storage(
                    &t.factory_code,
                    &t.lot_id,
                    &t.flavor_id,
                    p.grams,
                    Some(&p.location),
                    &p.manufactured_at,
                );
            }
            ActionBody::Use(t) => {
                self.take(&t.factory_code, &t.lot_id, &t.flavor_id, t.payload.grams, t.payload.location.as_deref())?;
            }
            ActionBody::Waste(t) => {
                self.take(&t.factory_code, &t.lot_id, &t.flavor_id, t.payload.grams, t.payload.location.as_deref())?;
            }
            ActionBody::MadeSplit(t) => {
                let lot = self.made(&t.factory_code, &t.lot_id, &t.flavor_id, &t.payload)?;
                return Ok(MutationAck::applied(Some(lot)));
            }
        }
        Ok(MutationAck::applied(Some(lot_id.to_string())))
    }

    fn take(
        &mut self,
        factory_code: &str,
        lot_id: &str,
        flavor_id: &str,
        grams: f64,
        location: Option<&str>,
    ) -> Result<(), Refusal> {
        let held = self.net_grams(lot_id);
        if grams > held + GRAMS_EPSILON {
            return refuse(
                ErrorCode::InsufficientStock,
                format!("lot {} holds {}g, {}g requested", lot_id, held, grams),
            );
        }
        let manufactured_at = self
            .storage
            .iter()
            .find(|r| r.lot_id == lot_id && !r.manufactured_at.is_empty())
            .map(|r| r.manufactured_at.clone())
            .unwrap_or_default();
        self.record_storage(factory_code, lot_id, flavor_id, -grams, location, &manufactured_at);
        Ok(())
    }

    /// Apply a production report; returns the lot the run was recorded under
    fn made(
        &mut self,
        factory_code: &str,
        lot_id: &str,
        flavor_id: &str,
        payload: &MadePayload,
    ) -> Result<String, Refusal> {
        let rows: Vec<usize> = self
            .orders
            .iter()
            .enumerate()
            .filter(|(_, r)| r.lot_id == lot_id)
            .map(|(i, _)| i)
            .collect();
        let Some(&first) = rows.first() else {
            return refuse(ErrorCode::OrderNotFound, format!("no order for lot {}", lot_id));
        };
        if self.orders[first].archived.unwrap_or(false) {
            return refuse(ErrorCode::OrderArchived, format!("order {} is archived", lot_id));
        }
        let target = rows
            .iter()
            .copied()
            .find(|&i| self.orders[i].flavor_id == flavor_id)
            .unwrap_or(first);

        {
            let row = &mut self.orders[target];
            let packs = cell(row.packs);
            let made_packs = cell(row.made_packs);
            if payload.packs > 0 && f64::from(payload.packs) > packs - made_packs {
                return refuse(
                    ErrorCode::PacksExceedRemaining,
                    format!("{} packs reported, {} remain", payload.packs, packs - made_packs),
                );
            }
            let made_packs = made_packs + f64::from(payload.packs);
            row.made_packs = Some(made_packs);
            row.made_grams = Some(cell(row.made_grams) + payload.grams);
            row.packs_remaining = Some((packs - made_packs).max(0.0));
        }

        let recorded_lot = match payload.split_lot_id.as_deref() {
            // a fresh proposal is taken as is; a taken one is renumbered
            Some(proposed) if !self.split_events.iter().any(|e| e == proposed) => {
                self.split_events.push(proposed.to_string());
                proposed.to_string()
            }
            Some(_) => {
                let child = next_child_sequence(self.split_events.iter().map(String::as_str), lot_id);
                let child_lot = match LotId::parse(lot_id) {
                    Some(parent) => parent.child(child).to_string(),
                    None => format!("{}-{:02}", lot_id, child),
                };
                self.split_events.push(child_lot.clone());
                child_lot
            }
            None => lot_id.to_string(),
        };

        self.record_made(
            factory_code,
            &recorded_lot,
            flavor_id,
            &payload.manufactured_at,
            payload.grams,
            payload.packs,
            payload.result,
            payload.leftover.as_ref(),
        );

        if rows.iter().all(|&i| row_fully_produced(&self.orders[i])) {
            for &i in &rows {
                self.orders[i].archived = Some(true);
            }
        }
        Ok(recorded_lot)
    }

    /// Per-lot sums for a factory, zero sums included
    fn storage_sums(&self, factory_code: &str) -> Vec<StorageAggRow> {
        let mut sums: Vec<StorageAggRow> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for event in self.storage.iter().filter(|r| r.factory_code == factory_code) {
            let pos = *index.entry(event.lot_id.as_str()).or_insert_with(|| {
                sums.push(StorageAggRow {
                    grams: Some(0.0),
                    locations: Vec::new(),
                    ..event.clone()
                });
                sums.len() - 1
            });
            let sum = &mut sums[pos];
            sum.grams = Some(cell_signed(sum.grams) + cell_signed(event.grams));
            for location in &event.locations {
                if !sum.locations.contains(location) {
                    sum.locations.push(location.clone());
                }
            }
        }
        sums
    }
}

fn cell_signed(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn masters(&self) -> ClientResult<Masters> {
        Ok(self.state.lock().masters.clone())
    }

    async fn orders(&self, factory_code: &str, archived: Option<bool>) -> ClientResult<Vec<OrderRow>> {
        let state = self.state.lock();
        Ok(state
            .orders
            .iter()
            .filter(|r| r.factory_code == factory_code)
            .filter(|r| archived.is_none_or(|a| r.archived.unwrap_or(false) == a))
            .cloned()
            .collect())
    }

    async fn storage_agg(&self, factory_code: &str) -> ClientResult<Vec<StorageAggRow>> {
        Ok(self.state.lock().storage_sums(factory_code))
    }

    async fn made_log(&self, query: &MadeLogQuery) -> ClientResult<Vec<MadeLogRow>> {
        let state = self.state.lock();
        Ok(state
            .made_log
            .iter()
            .filter(|r| r.factory_code == query.factory_code && query.contains(&r.manufactured_at))
            .cloned()
            .collect())
    }

    async fn submit(&self, envelope: &MutationEnvelope) -> ClientResult<MutationAck> {
        let fault = self.faults.lock().pop_front();
        let mut lose_answer = false;
        match fault {
            Some(Fault::Unavailable) => {
                return Err(ClientError::rejected(ErrorCode::NetworkError, "ledger unavailable"));
            }
            Some(Fault::TimeoutAfterApply) => lose_answer = true,
            Some(Fault::Delay(wait)) => tokio::time::sleep(wait).await,
            None => {}
        }

        match self.apply(envelope) {
            Ok(ack) if lose_answer => {
                tracing::debug!(request_id = %envelope.request_id, duplicate = ack.duplicate, "applied, answer dropped");
                Err(ClientError::Timeout(Duration::ZERO))
            }
            Ok(ack) => Ok(ack),
            Err((code, message)) => Err(ClientError::Rejected { code, message }),
        }
    }
}
