//! Storage rows returned by `GET storage-agg`

use super::lenient;
use serde::{Deserialize, Serialize};

/// A signed storage movement or a server-side partial sum for one lot
///
/// KEEP and leftover-from-MADE are positive, USE and WASTE negative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageAggRow {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub lot_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub factory_code: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub grams: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub packs_equiv: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub manufactured_at: String,
}
