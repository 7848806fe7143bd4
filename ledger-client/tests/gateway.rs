// ledger-client/tests/gateway.rs
// 幂等提交集成测试

mod common;

use common::{may, setup};
use ledger_client::{ActionSlot, Fault, GatewayError};
use shared::ErrorCode;
use shared::action::{CreateOrderDraft, CreateOrderLine, CreateOrderRequest, Mutation, OrderLineDraft};
use shared::order::UseType;
use std::time::Duration;

fn draft(packs: u32) -> CreateOrderDraft {
    CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F1", packs)])
}

fn create_request(lot_id: &str) -> Mutation {
    Mutation::CreateOrder(CreateOrderRequest {
        factory_code: "GT".to_string(),
        lot_id: lot_id.to_string(),
        ordered_at: "2024-05-01".to_string(),
        deadline_at: None,
        lines: vec![CreateOrderLine {
            flavor_id: "F1".to_string(),
            use_type: UseType::Retail,
            use_code: None,
            packs: 10,
            required_grams: 8500.0,
            oem_partner: None,
        }],
    })
}

#[tokio::test]
async fn test_lost_answer_retry_has_one_effect() {
    let (ledger, session) = setup();
    let slot = ActionSlot::new();

    ledger.inject(Fault::TimeoutAfterApply);
    let err = session.create_order(&slot, draft(160)).await.unwrap_err();
    assert!(err.is_unknown_outcome());
    let held = slot.held_request_id().expect("id held after failure");
    assert_eq!(err.request_id(), Some(held.as_str()));
    assert!(err.to_string().contains(&held));

    // the refresh after the failure already shows the order
    assert_eq!(session.orders().await.unwrap().len(), 1);

    // the retry mints a new lot but reuses the request id; the ledger replays
    let done = session.create_order(&slot, draft(160)).await.unwrap();
    assert_eq!(done.request_id, held);
    assert!(done.ack.duplicate);
    assert_eq!(done.ack.lot_id.as_deref(), Some("GT-20240501-001"));
    assert_eq!(ledger.effects(), 1);
    assert_eq!(slot.held_request_id(), None);

    let orders = session.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].lot_id, "GT-20240501-001");
}

#[tokio::test]
async fn test_failure_keeps_id_for_retry() {
    let (ledger, session) = setup();
    let slot = ActionSlot::new();

    ledger.inject(Fault::Unavailable);
    let err = session.create_order(&slot, draft(10)).await.unwrap_err();
    assert!(matches!(err, GatewayError::Failed { .. }));
    assert!(!err.is_unknown_outcome());
    assert!(!slot.is_busy());
    let held = slot.held_request_id().expect("id held after failure");
    assert_eq!(ledger.effects(), 0);

    // the retry re-mints; sequence 001 was reserved by the failed attempt
    let done = session.create_order(&slot, draft(10)).await.unwrap();
    assert_eq!(done.request_id, held);
    assert!(!done.ack.duplicate);
    assert_eq!(done.ack.lot_id.as_deref(), Some("GT-20240501-002"));
    assert_eq!(ledger.effects(), 1);

    // a new attempt on the same slot gets a new id
    let next = session.create_order(&slot, draft(5)).await.unwrap();
    assert_ne!(next.request_id, held);
    assert_eq!(next.ack.lot_id.as_deref(), Some("GT-20240501-003"));
}

#[tokio::test]
async fn test_lot_conflict_then_remint_under_same_id() {
    let (ledger, session) = setup();
    let other_client = ActionSlot::new();
    let slot = ActionSlot::new();

    session
        .gateway()
        .submit(&other_client, create_request("GT-20240501-001"))
        .await
        .unwrap();

    // a stale minted value collides at the ledger
    let err = session
        .gateway()
        .submit(&slot, create_request("GT-20240501-001"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LotIdConflict);
    let held = slot.held_request_id().expect("id held after conflict");

    let done = session.create_order(&slot, draft(10)).await.unwrap();
    assert_eq!(done.request_id, held);
    assert_eq!(done.ack.lot_id.as_deref(), Some("GT-20240501-002"));
    assert_eq!(ledger.effects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_flight_per_slot() {
    let (ledger, session) = setup();
    let gateway = session.gateway();
    let slot = ActionSlot::new();
    let other = ActionSlot::new();

    ledger.inject(Fault::Delay(Duration::from_secs(10)));
    let (first, second, independent) = tokio::join!(
        gateway.submit(&slot, create_request("GT-20240501-001")),
        gateway.submit(&slot, create_request("GT-20240501-001")),
        gateway.submit(&other, create_request("GT-20240501-002")),
    );

    let first = first.unwrap();
    match second {
        Err(GatewayError::InFlight { request_id }) => assert_eq!(request_id, first.request_id),
        other => panic!("expected in-flight rejection, got {:?}", other),
    }
    assert!(independent.is_ok());
    assert_eq!(ledger.effects(), 2);
    assert!(!slot.is_busy());
}

#[tokio::test]
async fn test_validation_never_reaches_the_ledger() {
    let (ledger, session) = setup();
    let slot = ActionSlot::new();

    let err = session
        .create_order(&slot, CreateOrderDraft::new(may(1), Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
    assert_eq!(err.code(), ErrorCode::OrderHasNoLines);

    let err = session
        .create_order(&slot, CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F9", 1)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FlavorNotFound);

    assert_eq!(slot.held_request_id(), None);
    assert_eq!(ledger.effects(), 0);
}
