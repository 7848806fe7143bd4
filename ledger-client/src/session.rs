//! Factory session
//!
//! One floor terminal bound to one factory. Reads are fresh projections of
//! the last fetched rows; writes go through the [`MutationGateway`] with the
//! caller's [`ActionSlot`].

use crate::cache::RowCache;
use crate::gateway::{ActionSlot, FactoryRows, MutationGateway, Submitted};
use crate::ledger::Ledger;
use crate::{ClientResult, GatewayError, GatewayResult};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use shared::action::{
    ActionBody, ActionTarget, CreateOrderDraft, KeepPayload, MadeReport, OnsiteMakeDraft,
    ReportMode, UsePayload, WastePayload,
};
use shared::lot::{LotId, SequenceCounter, next_child_sequence};
use shared::models::{MadeLogQuery, MadeLogRow};
use shared::order::{LotStatus, Order, aggregate_orders, derive_statuses};
use shared::storage::{LotGroup, StorageAggregateEntry, aggregate_storage, group_by_parent};
use shared::{AppError, ErrorCode, MastersIndex};
use std::sync::Arc;
use std::time::Duration;

/// High-level operations for one factory
#[derive(Debug)]
pub struct FactorySession {
    factory_code: String,
    gateway: MutationGateway,
    masters: RwLock<Option<Arc<MastersIndex>>>,
    counter: Mutex<SequenceCounter>,
}

impl FactorySession {
    pub fn new(ledger: Arc<dyn Ledger>, factory_code: impl Into<String>, timeout: Duration) -> Self {
        Self::with_gateway(
            MutationGateway::new(ledger, Arc::new(RowCache::new()), timeout),
            factory_code,
        )
    }

    pub fn with_gateway(gateway: MutationGateway, factory_code: impl Into<String>) -> Self {
        Self {
            factory_code: factory_code.into(),
            gateway,
            masters: RwLock::new(None),
            counter: Mutex::new(SequenceCounter::new()),
        }
    }

    pub fn factory_code(&self) -> &str {
        &self.factory_code
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    // ========== Reads ==========

    /// Indexed masters, fetched once
    pub async fn masters(&self) -> ClientResult<Arc<MastersIndex>> {
        if let Some(index) = self.masters.read().clone() {
            return Ok(index);
        }
        self.reload_masters().await
    }

    pub async fn reload_masters(&self) -> ClientResult<Arc<MastersIndex>> {
        let masters = self.gateway.bounded(self.gateway.ledger().masters()).await?;
        let index = Arc::new(MastersIndex::build(&masters));
        if let shared::MastersAvailability::Disabled(reason) = index.availability() {
            tracing::warn!(reason = %reason, "masters incomplete, input disabled");
        }
        *self.masters.write() = Some(index.clone());
        Ok(index)
    }

    /// Drop cached rows and fetch them again
    pub async fn refresh(&self) -> ClientResult<()> {
        self.gateway.refresh(&self.factory_code).await.map(|_| ())
    }

    async fn rows(&self) -> ClientResult<FactoryRows> {
        self.gateway.rows(&self.factory_code).await
    }

    /// Every order of the factory, archived included
    pub async fn orders(&self) -> ClientResult<Vec<Order>> {
        let rows = self.rows().await?;
        Ok(aggregate_orders(&rows.orders))
    }

    pub async fn open_orders(&self) -> ClientResult<Vec<Order>> {
        let mut orders = self.orders().await?;
        orders.retain(|o| !o.archived);
        Ok(orders)
    }

    /// Net inventory per lot; lots that net to zero are absent
    pub async fn inventory(&self) -> ClientResult<Vec<StorageAggregateEntry>> {
        let masters = self.masters().await?;
        let rows = self.rows().await?;
        Ok(aggregate_storage(&rows.storage, |flavor| masters.pack_to_gram(flavor)))
    }

    pub async fn inventory_groups(&self) -> ClientResult<Vec<LotGroup>> {
        Ok(group_by_parent(&self.inventory().await?))
    }

    pub async fn order_statuses(&self) -> ClientResult<Vec<(Order, LotStatus)>> {
        let orders = self.orders().await?;
        let storage = self.inventory().await?;
        Ok(derive_statuses(&orders, &storage)
            .into_iter()
            .map(|(order, status)| (order.clone(), status))
            .collect())
    }

    pub async fn made_log(&self, start: NaiveDate, end: NaiveDate) -> ClientResult<Vec<MadeLogRow>> {
        let query = MadeLogQuery::new(self.factory_code.clone(), start, end);
        self.gateway.bounded(self.gateway.ledger().made_log(&query)).await
    }

    // ========== Lot minting ==========

    /// Reserve the next parent lot id for `date`.
    ///
    /// Re-fetches every order (archived included) first. The value is a
    /// hint; the ledger refuses a lot id it already holds.
    pub async fn mint_lot_id(&self, date: NaiveDate) -> GatewayResult<LotId> {
        let rows = self
            .gateway
            .refresh(&self.factory_code)
            .await
            .map_err(GatewayError::Refresh)?;
        let lot = self.counter.lock().reserve_lot(
            rows.orders.iter().map(|r| r.lot_id.as_str()),
            &self.factory_code,
            date,
        );
        tracing::debug!(factory = %self.factory_code, lot_id = %lot, "lot id minted");
        Ok(lot)
    }

    // ========== Mutations ==========

    async fn ready_masters(&self) -> GatewayResult<Arc<MastersIndex>> {
        let masters = self.masters().await.map_err(GatewayError::Refresh)?;
        masters.availability().ensure_ready()?;
        Ok(masters)
    }

    fn ensure_idle(slot: &ActionSlot) -> GatewayResult<()> {
        if slot.is_busy() {
            return Err(GatewayError::InFlight {
                request_id: slot.held_request_id().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Create an order under a freshly minted lot id
    pub async fn create_order(&self, slot: &ActionSlot, draft: CreateOrderDraft) -> GatewayResult<Submitted> {
        Self::ensure_idle(slot)?;
        let masters = self.ready_masters().await?;
        let ordered_at = draft.ordered_at;
        let mut request = draft.build(&self.factory_code, &masters)?;
        request.lot_id = self.mint_lot_id(ordered_at).await?.to_string();
        self.gateway.submit(slot, request.into()).await
    }

    /// Put grams of a lot into a storage location
    pub async fn keep(
        &self,
        slot: &ActionSlot,
        lot_id: &str,
        flavor_id: &str,
        payload: KeepPayload,
    ) -> GatewayResult<Submitted> {
        let masters = self.ready_masters().await?;
        let locations = masters.locations(&self.factory_code);
        if !locations.is_empty() && !locations.iter().any(|l| l == payload.location.trim()) {
            return Err(AppError::with_message(
                ErrorCode::LocationUnknown,
                format!("unknown storage location {}", payload.location),
            )
            .into());
        }
        let body = ActionBody::Keep(ActionTarget::new(self.factory_code.as_str(), lot_id, flavor_id, payload));
        self.gateway.submit(slot, body.into()).await
    }

    /// Take grams of a lot out of storage for use
    pub async fn use_stock(
        &self,
        slot: &ActionSlot,
        lot_id: &str,
        flavor_id: &str,
        payload: UsePayload,
    ) -> GatewayResult<Submitted> {
        let body = ActionBody::Use(ActionTarget::new(self.factory_code.as_str(), lot_id, flavor_id, payload));
        self.gateway.submit(slot, body.into()).await
    }

    /// Discard grams of a lot
    pub async fn waste(
        &self,
        slot: &ActionSlot,
        lot_id: &str,
        flavor_id: &str,
        payload: WastePayload,
    ) -> GatewayResult<Submitted> {
        let body = ActionBody::Waste(ActionTarget::new(self.factory_code.as_str(), lot_id, flavor_id, payload));
        self.gateway.submit(slot, body.into()).await
    }

    /// Report production against an order.
    ///
    /// In split mode a child lot id is proposed from the split runs already
    /// in the made-log and the children in storage; the lot id in the
    /// acknowledgement is authoritative.
    pub async fn report_made(&self, slot: &ActionSlot, lot_id: &str, report: MadeReport) -> GatewayResult<Submitted> {
        Self::ensure_idle(slot)?;
        let masters = self.ready_masters().await?;
        let rows = self.rows().await.map_err(GatewayError::Refresh)?;
        let orders = aggregate_orders(&rows.orders);
        let order = orders.iter().find(|o| o.lot_id == lot_id).ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotFound, format!("no order for lot {}", lot_id))
        })?;

        let split_lot_id = match report.mode {
            ReportMode::Split => {
                let parent = LotId::parse(lot_id).ok_or_else(|| AppError::invalid_lot_id(lot_id))?;
                let runs = self.split_runs(&parent, report.manufactured_at).await?;
                let child = next_child_sequence(
                    runs.iter()
                        .map(|r| r.lot_id.as_str())
                        .chain(rows.storage.iter().map(|r| r.lot_id.as_str())),
                    lot_id,
                );
                Some(parent.child(child).to_string())
            }
            ReportMode::Bulk => None,
        };

        let body = report.build(order, &masters, split_lot_id)?;
        self.gateway.submit(slot, body.into()).await
    }

    /// Made-log rows from the lot's date onward. Every split run leaves one
    /// under its child lot, including runs that stored nothing.
    async fn split_runs(&self, parent: &LotId, manufactured_at: NaiveDate) -> GatewayResult<Vec<MadeLogRow>> {
        let end = manufactured_at.max(shared::util::today());
        let start = parent.date().unwrap_or(manufactured_at).min(end);
        self.made_log(start, end).await.map_err(GatewayError::Refresh)
    }

    /// Record unscheduled production under a freshly minted lot id
    pub async fn onsite_make(&self, slot: &ActionSlot, draft: OnsiteMakeDraft) -> GatewayResult<Submitted> {
        Self::ensure_idle(slot)?;
        let masters = self.ready_masters().await?;
        let manufactured_at = draft.manufactured_at;
        let mut request = draft.build(&self.factory_code, &masters)?;
        request.generated_lot_id = self.mint_lot_id(manufactured_at).await?.to_string();
        self.gateway.submit(slot, request.into()).await
    }
}
