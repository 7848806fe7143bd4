//! Reference data rows returned by `GET masters`

use super::lenient;
use serde::{Deserialize, Serialize};

/// Factory master row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub factory_code: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub factory_name: String,
}

/// Storage location belonging to a factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub factory_code: String,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub location_name: String,
}

/// Flavor master row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub flavor_name: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub liquid_name: String,
    /// Grams per pack; absent or zero means the ratio is unknown
    #[serde(default, deserialize_with = "lenient::number")]
    pub pack_to_gram: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expiry_days: Option<f64>,
}

/// One ingredient line of a flavor's recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub row_no: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub ingredient_name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: Option<String>,
}

/// OEM partner master row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OemPartnerRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub partner_name: String,
}

/// Use (purpose) master row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub use_code: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub use_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub use_type: Option<String>,
}

/// Flavor allowed for a use code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseFlavorRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub use_code: String,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
}

/// Floor staff who may sign reports
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReporterRow {
    #[serde(default, deserialize_with = "lenient::text")]
    pub reporter_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reporter_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub factory_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sort_order: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub active: Option<String>,
}

/// Full masters payload
///
/// Every table is optional on the wire; a missing table is an empty list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Masters {
    #[serde(default)]
    pub factories: Vec<FactoryRow>,
    #[serde(default)]
    pub locations: Vec<LocationRow>,
    #[serde(default)]
    pub flavors: Vec<FlavorRow>,
    #[serde(default)]
    pub recipes: Vec<RecipeRow>,
    #[serde(default)]
    pub oem_partners: Vec<OemPartnerRow>,
    #[serde(default)]
    pub uses: Vec<UseRow>,
    #[serde(default)]
    pub use_flavors: Vec<UseFlavorRow>,
    #[serde(default)]
    pub reporters: Vec<ReporterRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masters_tolerates_missing_tables_and_string_numbers() {
        let masters: Masters = serde_json::from_str(
            r#"{
                "factories": [{"factory_code": "GT", "factory_name": "玄海"}],
                "flavors": [{"flavor_id": "F1", "flavor_name": "柚子", "pack_to_gram": "850"}]
            }"#,
        )
        .unwrap();
        assert_eq!(masters.factories.len(), 1);
        assert_eq!(masters.flavors[0].pack_to_gram, Some(850.0));
        assert_eq!(masters.flavors[0].expiry_days, None);
        assert!(masters.locations.is_empty());
        assert!(masters.reporters.is_empty());
    }
}
