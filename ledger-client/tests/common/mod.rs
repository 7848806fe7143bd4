// ledger-client/tests/common/mod.rs
// 测试共用的 masters 与会话构造

#![allow(dead_code)]

use chrono::NaiveDate;
use ledger_client::{FactorySession, InMemoryLedger};
use shared::models::Masters;
use std::sync::Arc;
use std::time::Duration;

pub fn masters() -> Masters {
    serde_json::from_value(serde_json::json!({
        "factories": [{"factory_code": "GT", "factory_name": "玄海"}],
        "locations": [
            {"factory_code": "GT", "location_name": "冷蔵庫"},
            {"factory_code": "GT", "location_name": "冷凍庫"}
        ],
        "flavors": [
            {"flavor_id": "F1", "flavor_name": "柚子", "liquid_name": "柚子液", "pack_to_gram": 850, "expiry_days": 30}
        ],
        "uses": [{"use_code": "U1", "use_name": "自社", "use_type": "fissule"}]
    }))
    .expect("masters fixture")
}

pub fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).expect("valid day")
}

pub fn setup() -> (Arc<InMemoryLedger>, FactorySession) {
    let ledger = Arc::new(InMemoryLedger::new(masters()));
    let session = FactorySession::new(ledger.clone(), "GT", Duration::from_secs(30));
    (ledger, session)
}
