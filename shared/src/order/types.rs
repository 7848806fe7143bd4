//! Order entities merged from flat ledger rows

use crate::quantity::grams_for_packs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Produced amounts within this distance of the requested amount count as done
pub(crate) const PROGRESS_EPSILON: f64 = 1e-6;

// ============================================================================
// Use Type
// ============================================================================

/// Why an order exists; decides whether it is counted in packs or grams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UseType {
    /// 自社商品 - packed for retail, counted in packs
    #[default]
    Retail,
    /// OEM - made for a named partner, counted in grams
    Oem,
}

impl UseType {
    /// Ledger label written back on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retail => "fissule",
            Self::Oem => "oem",
        }
    }

    /// `oem` in any case is OEM; every other label (including blank) is retail
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("oem") {
            Self::Oem
        } else {
            Self::Retail
        }
    }

    pub fn is_oem(&self) -> bool {
        matches!(self, Self::Oem)
    }
}

impl std::fmt::Display for UseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UseType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UseType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Self::from_label).unwrap_or_default())
    }
}

// ============================================================================
// Order Line
// ============================================================================

/// One flavor/quantity line of an order
///
/// All quantities are finite and non-negative after aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub flavor_id: String,
    pub use_type: UseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,
    /// Requested packs (0 for gram-only lines)
    pub packs: f64,
    /// Requested grams
    pub required_grams: f64,
    pub made_packs: f64,
    pub made_grams: f64,
    /// `max(0, packs - made_packs)` unless the ledger overrides it
    pub packs_remaining: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oem_partner: Option<String>,
}

impl OrderLine {
    /// A retail line of `packs` packs; grams follow from the flavor ratio
    pub fn retail(flavor_id: impl Into<String>, packs: u32, pack_to_gram: f64) -> Self {
        let packs_f = f64::from(packs);
        Self {
            flavor_id: flavor_id.into(),
            use_type: UseType::Retail,
            use_code: None,
            packs: packs_f,
            required_grams: grams_for_packs(packs, pack_to_gram),
            made_packs: 0.0,
            made_grams: 0.0,
            packs_remaining: packs_f,
            oem_partner: None,
        }
    }

    /// A gram-only OEM line for `partner`
    pub fn oem(flavor_id: impl Into<String>, grams: f64, partner: impl Into<String>) -> Self {
        Self {
            flavor_id: flavor_id.into(),
            use_type: UseType::Oem,
            use_code: None,
            packs: 0.0,
            required_grams: grams.max(0.0),
            made_packs: 0.0,
            made_grams: 0.0,
            packs_remaining: 0.0,
            oem_partner: Some(partner.into()),
        }
    }

    pub fn is_oem(&self) -> bool {
        self.use_type.is_oem()
    }

    /// Whether progress on this line is counted in packs
    pub fn counts_packs(&self) -> bool {
        !self.is_oem() && self.packs > 0.0
    }

    /// Split reporting needs a pack count to split
    pub fn can_split(&self) -> bool {
        self.counts_packs()
    }

    /// Requested amount in this line's unit (packs or grams)
    pub fn requested(&self) -> f64 {
        if self.counts_packs() {
            self.packs
        } else {
            self.required_grams
        }
    }

    /// Produced amount in this line's unit (packs or grams)
    pub fn produced(&self) -> f64 {
        if self.counts_packs() {
            self.made_packs
        } else {
            self.made_grams
        }
    }

    /// A line asking for nothing is done as soon as anything was made
    pub fn is_fully_produced(&self) -> bool {
        let requested = self.requested();
        if requested > 0.0 {
            self.produced() + PROGRESS_EPSILON >= requested
        } else {
            self.produced() > 0.0
        }
    }

    pub fn has_progress(&self) -> bool {
        self.produced() > 0.0
    }

    /// Grams still to make: remaining packs converted, or the gram shortfall
    pub fn remaining_grams(&self, pack_to_gram: f64) -> f64 {
        if self.counts_packs() {
            let packs = self.packs_remaining.max(0.0).round();
            grams_for_packs(packs as u32, pack_to_gram)
        } else {
            (self.required_grams - self.made_grams).max(0.0)
        }
    }
}

// ============================================================================
// Order
// ============================================================================

/// An order (ticket) with one or more lines, identified by its lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub lot_id: String,
    pub factory_code: String,
    /// `yyyy-MM-dd`
    pub ordered_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_at: Option<String>,
    pub lines: Vec<OrderLine>,
    pub archived: bool,
}

impl Order {
    /// The line reports act on; orders from the office form have exactly one
    pub fn primary_line(&self) -> Option<&OrderLine> {
        self.lines.first()
    }

    pub fn line_for(&self, flavor_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.flavor_id == flavor_id)
    }

    /// Every line has produced its requested amount (false with no lines)
    pub fn is_fully_produced(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(OrderLine::is_fully_produced)
    }

    pub fn has_progress(&self) -> bool {
        self.lines.iter().any(OrderLine::has_progress)
    }

    pub fn total_packs(&self) -> f64 {
        self.lines.iter().map(|l| l.packs).sum()
    }

    pub fn total_made_packs(&self) -> f64 {
        self.lines.iter().map(|l| l.made_packs).sum()
    }

    pub fn total_packs_remaining(&self) -> f64 {
        self.lines.iter().map(|l| l.packs_remaining).sum()
    }

    pub fn total_required_grams(&self) -> f64 {
        self.lines.iter().map(|l| l.required_grams).sum()
    }

    pub fn is_oem(&self) -> bool {
        self.lines.iter().any(OrderLine::is_oem)
    }

    pub fn ordered_date(&self) -> Option<chrono::NaiveDate> {
        crate::util::parse_ledger_date(&self.ordered_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_type_labels() {
        assert_eq!(UseType::from_label("OEM"), UseType::Oem);
        assert_eq!(UseType::from_label(" oem "), UseType::Oem);
        assert_eq!(UseType::from_label("fissule"), UseType::Retail);
        assert_eq!(UseType::from_label("retail"), UseType::Retail);
        assert_eq!(UseType::from_label(""), UseType::Retail);

        assert_eq!(serde_json::to_string(&UseType::Retail).unwrap(), "\"fissule\"");
        let parsed: UseType = serde_json::from_str("\"Oem\"").unwrap();
        assert_eq!(parsed, UseType::Oem);
        let parsed: UseType = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, UseType::Retail);
    }

    #[test]
    fn test_retail_line_progress() {
        let mut line = OrderLine::retail("F1", 100, 850.0);
        assert_eq!(line.required_grams, 85_000.0);
        assert!(line.can_split());
        assert!(!line.has_progress());

        line.made_packs = 40.0;
        assert!(line.has_progress());
        assert!(!line.is_fully_produced());

        line.made_packs = 100.0;
        assert!(line.is_fully_produced());
    }

    #[test]
    fn test_oem_line_counts_grams() {
        let mut line = OrderLine::oem("F1", 5000.0, "Acme");
        assert!(!line.can_split());
        assert_eq!(line.requested(), 5000.0);
        line.made_packs = 10.0;
        assert!(!line.has_progress());
        line.made_grams = 5000.0;
        assert!(line.is_fully_produced());
        assert_eq!(line.remaining_grams(850.0), 0.0);
    }

    #[test]
    fn test_zero_request_line() {
        let mut line = OrderLine::retail("F1", 0, 850.0);
        assert!(!line.is_fully_produced());
        line.made_grams = 10.0;
        assert!(line.is_fully_produced());
    }

    #[test]
    fn test_remaining_grams_for_packs() {
        let mut line = OrderLine::retail("F1", 160, 850.0);
        line.made_packs = 60.0;
        line.packs_remaining = 100.0;
        assert_eq!(line.remaining_grams(850.0), 85_000.0);
    }
}
