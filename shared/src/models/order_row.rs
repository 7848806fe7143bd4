//! Flat order-line rows returned by `GET orders`

use super::lenient;
use serde::{Deserialize, Serialize};

/// One order line as stored in the ledger
///
/// Several rows share an `order_id` when an order has more than one line.
/// Numeric cells are optional because the sheet may leave them blank;
/// [`crate::order::aggregate_orders`] coerces them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderRow {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub order_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub lot_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub factory_code: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub ordered_at: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub deadline_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
    /// `oem` or the retail label; compared case-insensitively
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,
    /// Requested packs (0 for OEM orders)
    #[serde(default, deserialize_with = "lenient::number")]
    pub packs: Option<f64>,
    /// Server-side override of the remaining packs
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub packs_remaining: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub made_packs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub made_grams: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub required_grams: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub oem_partner: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub archived: Option<bool>,
}
