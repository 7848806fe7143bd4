//! The external ledger seam
//!
//! The ledger owns durable storage and is the source of truth. Reads return
//! flat rows that the `shared` aggregators project; writes are idempotent by
//! `request_id`.

use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::Deserialize;
use shared::ErrorCode;
use shared::action::{MutationAck, MutationEnvelope};
use shared::models::{Masters, MadeLogQuery, MadeLogRow, OrderRow, StorageAggRow};

/// Operations the external ledger exposes
#[async_trait]
pub trait Ledger: Send + Sync {
    /// `GET masters`
    async fn masters(&self) -> ClientResult<Masters>;

    /// `GET orders`; `archived: None` returns archived and open orders
    async fn orders(&self, factory_code: &str, archived: Option<bool>) -> ClientResult<Vec<OrderRow>>;

    /// `GET storage-agg`; rows may include lots that net to zero
    async fn storage_agg(&self, factory_code: &str) -> ClientResult<Vec<StorageAggRow>>;

    /// `GET made-log`
    async fn made_log(&self, query: &MadeLogQuery) -> ClientResult<Vec<MadeLogRow>>;

    /// `POST <path>`; a repeated `request_id` must not repeat the effect
    async fn submit(&self, envelope: &MutationEnvelope) -> ClientResult<MutationAck>;
}

/// List endpoints answer with a bare array or with `{ "rows": [...] }`.
///
/// Any other object is a failure reply, even when the HTTP status was 200.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Rows<T> {
    Bare(Vec<T>),
    Wrapped {
        rows: Vec<T>,
        #[serde(default)]
        ok: Option<bool>,
        #[serde(default)]
        error: Option<String>,
    },
    Failed {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T> Rows<T> {
    pub(crate) fn into_result(self) -> ClientResult<Vec<T>> {
        match self {
            Self::Bare(rows) => Ok(rows),
            Self::Wrapped { ok: Some(false), error, .. } => Err(ClientError::rejected(
                ErrorCode::InternalError,
                error.unwrap_or_else(|| "ledger answered ok: false".to_string()),
            )),
            Self::Wrapped { rows, .. } => Ok(rows),
            Self::Failed { error, message } => match error.or(message) {
                Some(message) => Err(ClientError::rejected(ErrorCode::InternalError, message)),
                None => Err(ClientError::InvalidResponse(
                    "list reply carries no rows".to_string(),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_accept_both_shapes() {
        let bare: Rows<OrderRow> =
            serde_json::from_str(r#"[{"order_id": "O-1", "packs": "3"}]"#).unwrap();
        assert_eq!(bare.into_result().unwrap()[0].packs, Some(3.0));

        let wrapped: Rows<OrderRow> = serde_json::from_str(
            r#"{"ok": true, "rows": [{"order_id": "O-1"}, {"order_id": "O-2"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_result().unwrap().len(), 2);

        let none: Rows<OrderRow> = serde_json::from_str(r#"{"rows": []}"#).unwrap();
        assert!(none.into_result().unwrap().is_empty());
    }

    #[test]
    fn test_error_bodies_are_not_empty_lists() {
        let refused: Rows<OrderRow> =
            serde_json::from_str(r#"{"ok": false, "error": "unauthorized"}"#).unwrap();
        match refused.into_result() {
            Err(ClientError::Rejected { message, .. }) => assert_eq!(message, "unauthorized"),
            other => panic!("expected rejection, got {:?}", other),
        }

        let refused: Rows<OrderRow> =
            serde_json::from_str(r#"{"ok": false, "error": "quota", "rows": []}"#).unwrap();
        assert!(refused.into_result().is_err());

        let empty: Rows<OrderRow> = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.into_result(), Err(ClientError::InvalidResponse(_))));
    }

    #[test]
    fn test_keyless_row_does_not_fail_the_list() {
        let rows: Rows<OrderRow> = serde_json::from_str(
            r#"[{"order_id": "O-1", "lot_id": "GT-20240501-001"}, {"lot_id": "GT-20240501-002"}]"#,
        )
        .unwrap();
        let rows = rows.into_result().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].order_id, "");

        let storage: Rows<StorageAggRow> =
            serde_json::from_str(r#"[{"lot_id": "GT-20240501-001", "grams": 5}, {"grams": 3}]"#)
                .unwrap();
        let storage = storage.into_result().unwrap();
        assert_eq!(storage.len(), 2);
        assert_eq!(storage[1].lot_id, "");
    }
}
