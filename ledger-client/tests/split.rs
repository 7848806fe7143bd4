// ledger-client/tests/split.rs
// 分割製造の子ロット採番

mod common;

use async_trait::async_trait;
use common::{masters, may};
use ledger_client::{ActionSlot, ClientResult, FactorySession, InMemoryLedger, Ledger};
use parking_lot::Mutex;
use shared::action::{ActionBody, MadeReport, MadeResult, Mutation, MutationAck, MutationEnvelope};
use shared::action::{CreateOrderDraft, OrderLineDraft};
use shared::models::{MadeLogQuery, MadeLogRow, Masters, OrderRow, StorageAggRow};
use std::sync::Arc;
use std::time::Duration;

const LOT: &str = "GT-20240501-001";

/// Forwards to the in-memory ledger and keeps the child lot each split report proposed
struct RecordingLedger {
    inner: InMemoryLedger,
    proposed: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl Ledger for RecordingLedger {
    async fn masters(&self) -> ClientResult<Masters> {
        self.inner.masters().await
    }

    async fn orders(&self, factory_code: &str, archived: Option<bool>) -> ClientResult<Vec<OrderRow>> {
        self.inner.orders(factory_code, archived).await
    }

    async fn storage_agg(&self, factory_code: &str) -> ClientResult<Vec<StorageAggRow>> {
        self.inner.storage_agg(factory_code).await
    }

    async fn made_log(&self, query: &MadeLogQuery) -> ClientResult<Vec<MadeLogRow>> {
        self.inner.made_log(query).await
    }

    async fn submit(&self, envelope: &MutationEnvelope) -> ClientResult<MutationAck> {
        if let Mutation::Action(ActionBody::MadeSplit(target)) = &envelope.mutation {
            self.proposed.lock().push(target.payload.split_lot_id.clone());
        }
        self.inner.submit(envelope).await
    }
}

fn setup() -> (Arc<RecordingLedger>, FactorySession) {
    let ledger = Arc::new(RecordingLedger {
        inner: InMemoryLedger::new(masters()),
        proposed: Mutex::new(Vec::new()),
    });
    let session = FactorySession::new(ledger.clone(), "GT", Duration::from_secs(30));
    (ledger, session)
}

#[tokio::test]
async fn test_used_up_splits_propose_fresh_children() {
    let (ledger, session) = setup();
    session
        .create_order(
            &ActionSlot::new(),
            CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F1", 160)]),
        )
        .await
        .unwrap();

    // neither of the first two runs leaves anything in storage
    let first = session
        .report_made(&ActionSlot::new(), LOT, MadeReport::split(60, may(2), MadeResult::Used))
        .await
        .unwrap();
    let second = session
        .report_made(&ActionSlot::new(), LOT, MadeReport::split(40, may(3), MadeResult::Used))
        .await
        .unwrap();
    let third = session
        .report_made(
            &ActionSlot::new(),
            LOT,
            MadeReport::split(20, may(4), MadeResult::Extra).with_leftover("冷蔵庫", 300.0),
        )
        .await
        .unwrap();

    assert_eq!(
        *ledger.proposed.lock(),
        vec![
            Some("GT-20240501-001-01".to_string()),
            Some("GT-20240501-001-02".to_string()),
            Some("GT-20240501-001-03".to_string()),
        ]
    );
    assert_eq!(first.lot_id(LOT), "GT-20240501-001-01");
    assert_eq!(second.lot_id(LOT), "GT-20240501-001-02");
    assert_eq!(third.lot_id(LOT), "GT-20240501-001-03");

    let open = session.open_orders().await.unwrap();
    assert_eq!(open[0].total_packs_remaining(), 40.0);
}
