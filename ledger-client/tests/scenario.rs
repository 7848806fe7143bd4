// ledger-client/tests/scenario.rs
// 订单到库存的完整流程

mod common;

use common::{may, setup};
use ledger_client::{ActionSlot, GatewayError};
use shared::ErrorCode;
use shared::action::{
    CreateOrderDraft, KeepPayload, MadeReport, MadeResult, OnsiteMakeDraft, OrderLineDraft,
    UsePayload, WastePayload,
};
use shared::models::MadeLogStatus;
use shared::order::LotStatus;

const LOT: &str = "GT-20240501-001";

async fn status_of(session: &ledger_client::FactorySession, lot_id: &str) -> LotStatus {
    session
        .order_statuses()
        .await
        .unwrap()
        .into_iter()
        .find(|(order, _)| order.lot_id == lot_id)
        .map(|(_, status)| status)
        .expect("order present")
}

#[tokio::test]
async fn test_order_split_bulk_and_leftover() {
    let (_ledger, session) = setup();

    // create: 160 packs of an 850 g/pack flavor
    let created = session
        .create_order(
            &ActionSlot::new(),
            CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F1", 160)]),
        )
        .await
        .unwrap();
    assert_eq!(created.ack.lot_id.as_deref(), Some(LOT));
    assert_eq!(status_of(&session, LOT).await, LotStatus::Ordered);

    let order = &session.orders().await.unwrap()[0];
    assert_eq!(order.total_required_grams(), 136_000.0);

    // split: 60 packs under the first child lot
    let split = session
        .report_made(&ActionSlot::new(), LOT, MadeReport::split(60, may(2), MadeResult::Used))
        .await
        .unwrap();
    assert_eq!(split.lot_id(LOT), "GT-20240501-001-01");

    let open = session.open_orders().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].total_packs_remaining(), 100.0);
    assert_eq!(status_of(&session, LOT).await, LotStatus::InProgress);

    // more than remaining is refused before sending
    let err = session
        .report_made(&ActionSlot::new(), LOT, MadeReport::split(101, may(3), MadeResult::Used))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
    assert_eq!(err.code(), ErrorCode::PacksExceedRemaining);

    // bulk: the remaining 100 packs, 5 kg kept in the fridge
    let bulk = session
        .report_made(
            &ActionSlot::new(),
            LOT,
            MadeReport::bulk(may(3), MadeResult::Extra).with_leftover("冷蔵庫", 5000.0),
        )
        .await
        .unwrap();
    assert_eq!(bulk.lot_id(LOT), LOT);

    let orders = session.orders().await.unwrap();
    assert!(orders[0].archived);
    assert!(orders[0].is_fully_produced());
    assert!(session.open_orders().await.unwrap().is_empty());
    // leftover wins over the fully-produced states
    assert_eq!(status_of(&session, LOT).await, LotStatus::Stored);

    let inventory = session.inventory().await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].grams, 5000.0);
    assert_eq!(inventory[0].locations, vec!["冷蔵庫"]);
    let packs = inventory[0].packs_equiv.unwrap();
    assert!((packs - 5000.0 / 850.0).abs() < 1e-9);

    let log = session.made_log(may(1), may(31)).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].lot_id, "GT-20240501-001-01");
    assert_eq!(log[0].status, MadeLogStatus::FullyUsed);
    assert_eq!(log[1].status, MadeLogStatus::Completed);
    assert_eq!(log[1].flavor_name, "柚子");

    // using up the leftover leaves the order fully consumed
    session
        .use_stock(
            &ActionSlot::new(),
            LOT,
            "F1",
            UsePayload {
                grams: 5000.0,
                location: Some("冷蔵庫".to_string()),
                by: None,
            },
        )
        .await
        .unwrap();
    assert!(session.inventory().await.unwrap().is_empty());
    assert_eq!(status_of(&session, LOT).await, LotStatus::FullyConsumed);
}

#[tokio::test]
async fn test_storage_moves_and_grouping() {
    let (_ledger, session) = setup();
    session
        .create_order(
            &ActionSlot::new(),
            CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F1", 10)]),
        )
        .await
        .unwrap();
    session
        .report_made(
            &ActionSlot::new(),
            LOT,
            MadeReport::split(4, may(2), MadeResult::Extra).with_leftover("冷凍庫", 300.0),
        )
        .await
        .unwrap();

    let keep = KeepPayload {
        location: "冷蔵庫".to_string(),
        grams: 500.0,
        manufactured_at: "2024-05-01".to_string(),
        by: Some("R1".to_string()),
    };
    session.keep(&ActionSlot::new(), LOT, "F1", keep.clone()).await.unwrap();

    let err = session
        .keep(
            &ActionSlot::new(),
            LOT,
            "F1",
            KeepPayload {
                location: "倉庫".to_string(),
                ..keep
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LocationUnknown);

    session
        .waste(
            &ActionSlot::new(),
            LOT,
            "F1",
            WastePayload {
                grams: 100.0,
                location: None,
                reason: Some("容器破損".to_string()),
                by: None,
            },
        )
        .await
        .unwrap();

    // more than held is refused by the ledger
    let err = session
        .use_stock(
            &ActionSlot::new(),
            LOT,
            "F1",
            UsePayload {
                grams: 1000.0,
                location: None,
                by: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    let groups = session.inventory_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.parent_lot_id, LOT);
    assert_eq!(group.parent.as_ref().map(|p| p.grams), Some(400.0));
    assert_eq!(group.children.len(), 1);
    assert_eq!(group.children[0].lot_id, "GT-20240501-001-01");
    assert_eq!(group.total_grams(), 700.0);
    assert_eq!(status_of(&session, LOT).await, LotStatus::Stored);
}

#[tokio::test]
async fn test_onsite_make_mints_from_manufacture_date() {
    let (_ledger, session) = setup();
    session
        .create_order(
            &ActionSlot::new(),
            CreateOrderDraft::new(may(1), vec![OrderLineDraft::packs("F1", 10)]),
        )
        .await
        .unwrap();

    let made = session
        .onsite_make(
            &ActionSlot::new(),
            OnsiteMakeDraft::new("F1", " U1 ", 2, may(1)).with_leftover("冷蔵庫", 200.0),
        )
        .await
        .unwrap();
    let lot = made.ack.lot_id.clone().expect("lot in ack");
    assert_eq!(lot, "GT-20240501-002");

    let statuses = session.order_statuses().await.unwrap();
    let (order, status) = statuses
        .iter()
        .find(|(o, _)| o.lot_id == lot)
        .expect("synthesized order");
    assert!(order.archived);
    assert_eq!(order.lines[0].required_grams, 1700.0);
    assert_eq!(*status, LotStatus::Stored);

    let err = session
        .onsite_make(&ActionSlot::new(), OnsiteMakeDraft::new("F1", "", 2, may(1)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequiredField);
}
