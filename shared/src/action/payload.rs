//! Payloads of `POST action`

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Action kind, sent as `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Keep,
    Use,
    Waste,
    MadeSplit,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Use => "USE",
            Self::Waste => "WASTE",
            Self::MadeSplit => "MADE_SPLIT",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn positive_grams(field: &str, grams: f64) -> AppResult<()> {
    if grams.is_finite() && grams > 0.0 {
        Ok(())
    } else {
        Err(AppError::out_of_range(field, format!("{} must be positive", field)))
    }
}

fn required_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        Err(AppError::required(field))
    } else {
        Ok(())
    }
}

/// Put stock into a storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepPayload {
    pub location: String,
    pub grams: f64,
    /// `yyyy-MM-dd`
    pub manufactured_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl KeepPayload {
    pub fn validate(&self) -> AppResult<()> {
        required_text("location", &self.location)?;
        positive_grams("grams", self.grams)?;
        required_text("manufactured_at", &self.manufactured_at)
    }
}

/// Take stock out for use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsePayload {
    pub grams: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl UsePayload {
    pub fn validate(&self) -> AppResult<()> {
        positive_grams("grams", self.grams)
    }
}

/// Discard stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WastePayload {
    pub grams: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl WastePayload {
    pub fn validate(&self) -> AppResult<()> {
        positive_grams("grams", self.grams)
    }
}

/// What happened to a production run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MadeResult {
    /// Leftover was stored
    Extra,
    /// Everything was used
    #[default]
    Used,
}

/// Leftover kept after a production run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leftover {
    pub location: String,
    pub grams: f64,
}

impl Leftover {
    pub fn new(location: impl Into<String>, grams: f64) -> Self {
        Self {
            location: location.into(),
            grams,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        required_text("leftover.location", &self.location)?;
        positive_grams("leftover.grams", self.grams)
    }
}

/// Ingredient actually used, as entered on the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<String>,
    pub ingredient_name: String,
    pub reported_qty: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_location: Option<String>,
    #[serde(default = "MaterialLine::entered")]
    pub source: String,
}

impl MaterialLine {
    fn entered() -> String {
        "entered".to_string()
    }

    pub fn new(ingredient_name: impl Into<String>, reported_qty: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        Self {
            ingredient_id: None,
            ingredient_name: ingredient_name.into(),
            reported_qty,
            unit: if unit.trim().is_empty() { "g".to_string() } else { unit },
            store_location: None,
            source: Self::entered(),
        }
    }

    /// Lines worth sending: named and with a positive quantity
    pub fn is_reportable(&self) -> bool {
        !self.ingredient_name.trim().is_empty()
            && self.reported_qty.is_finite()
            && self.reported_qty > 0.0
    }
}

/// Production report for an order (`MADE_SPLIT`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MadePayload {
    /// Packs produced (0 for gram-only lines)
    pub packs: u32,
    pub grams: f64,
    /// `yyyy-MM-dd`
    pub manufactured_at: String,
    pub result: MadeResult,
    pub leftover: Option<Leftover>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialLine>,
    /// Proposed child lot for a split report; the ledger's answer wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl MadePayload {
    pub fn validate(&self) -> AppResult<()> {
        positive_grams("grams", self.grams)?;
        required_text("manufactured_at", &self.manufactured_at)?;
        match (self.result, &self.leftover) {
            (MadeResult::Extra, Some(leftover)) => leftover.validate(),
            (MadeResult::Extra, None) => Err(AppError::required("leftover")),
            (MadeResult::Used, Some(_)) => Err(AppError::validation(
                "leftover is only sent when the result is extra",
            )),
            (MadeResult::Used, None) => Ok(()),
        }
    }
}
