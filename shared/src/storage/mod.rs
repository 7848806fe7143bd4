//! Current inventory per lot
//!
//! The ledger returns signed storage rows (or server-side partial sums). They
//! are re-summed per lot here, near-zero lots are dropped so fully consumed
//! lots disappear, and split-child lots are nested under their parent for
//! display.

use crate::lot::{family_root, parent_lot_id};
use crate::models::StorageAggRow;
use crate::quantity::packs_equivalent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Net grams at or below this magnitude are treated as zero
pub const GRAMS_EPSILON: f64 = 1e-6;

/// Net inventory held for one lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageAggregateEntry {
    pub lot_id: String,
    pub factory_code: String,
    pub flavor_id: String,
    /// Signed events summed
    pub grams: f64,
    /// `None` when the flavor's pack ratio is unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packs_equiv: Option<f64>,
    /// Every location that ever held the lot, first-seen order
    pub locations: Vec<String>,
    /// `yyyy-MM-dd`; first non-empty value seen
    pub manufactured_at: String,
}

impl StorageAggregateEntry {
    /// Parent lot when this entry is a split child
    pub fn parent_lot_id(&self) -> Option<&str> {
        parent_lot_id(&self.lot_id)
    }

    pub fn is_child(&self) -> bool {
        self.parent_lot_id().is_some()
    }

    /// Parent for children, the lot itself otherwise
    pub fn family_root(&self) -> &str {
        family_root(&self.lot_id)
    }

    fn empty(row: &StorageAggRow) -> Self {
        Self {
            lot_id: row.lot_id.trim().to_string(),
            factory_code: String::new(),
            flavor_id: String::new(),
            grams: 0.0,
            packs_equiv: None,
            locations: Vec::new(),
            manufactured_at: String::new(),
        }
    }

    fn absorb(&mut self, row: &StorageAggRow) {
        if let Some(grams) = row.grams.filter(|g| g.is_finite()) {
            self.grams += grams;
        }
        if let Some(packs) = row.packs_equiv.filter(|p| p.is_finite()) {
            self.packs_equiv = Some(self.packs_equiv.unwrap_or(0.0) + packs);
        }
        if self.factory_code.is_empty() {
            self.factory_code = row.factory_code.trim().to_string();
        }
        if self.flavor_id.is_empty() {
            self.flavor_id = row.flavor_id.trim().to_string();
        }
        if self.manufactured_at.is_empty() {
            self.manufactured_at = row.manufactured_at.trim().to_string();
        }
        for location in &row.locations {
            let location = location.trim();
            if !location.is_empty() && !self.locations.iter().any(|l| l == location) {
                self.locations.push(location.to_string());
            }
        }
    }
}

/// Sum storage rows into one entry per lot id.
///
/// `pack_to_gram` looks up a flavor's ratio for the pack equivalent; when it
/// has none, the summed `packs_equiv` the ledger sent is kept. Entries
/// whose net grams are within [`GRAMS_EPSILON`] of zero are dropped. Output
/// keeps first-seen lot order; rows without a lot id are skipped.
pub fn aggregate_storage<F>(rows: &[StorageAggRow], pack_to_gram: F) -> Vec<StorageAggregateEntry>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut entries: Vec<StorageAggregateEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let lot_id = row.lot_id.trim();
        if lot_id.is_empty() {
            continue;
        }
        let pos = *index.entry(lot_id).or_insert_with(|| {
            entries.push(StorageAggregateEntry::empty(row));
            entries.len() - 1
        });
        entries[pos].absorb(row);
    }

    entries.retain(|e| e.grams.abs() > GRAMS_EPSILON);
    for entry in &mut entries {
        // the server's figure stands in for flavors missing from masters
        entry.packs_equiv = pack_to_gram(&entry.flavor_id)
            .and_then(|ratio| packs_equivalent(entry.grams, ratio))
            .or(entry.packs_equiv);
    }
    entries
}

/// Inventory of a lot family for one flavor: the parent lot's own stock plus
/// the stock of its split children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotGroup {
    pub parent_lot_id: String,
    pub flavor_id: String,
    /// Stock recorded directly under the parent lot, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<StorageAggregateEntry>,
    pub children: Vec<StorageAggregateEntry>,
}

impl LotGroup {
    pub fn total_grams(&self) -> f64 {
        self.parent.iter().chain(&self.children).map(|e| e.grams).sum()
    }

    /// Sum of pack equivalents; `None` if any member's ratio is unknown
    pub fn total_packs_equiv(&self) -> Option<f64> {
        self.parent
            .iter()
            .chain(&self.children)
            .map(|e| e.packs_equiv)
            .sum()
    }

    /// Locations across the family, first-seen order
    pub fn locations(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for location in self.parent.iter().chain(&self.children).flat_map(|e| &e.locations) {
            if !out.contains(&location.as_str()) {
                out.push(location);
            }
        }
        out
    }
}

/// Nest entries under `(parent_lot_id, flavor_id)`.
///
/// Parent lots and ids that are not split children head their own group.
/// Groups come out sorted by key; children keep their input order.
pub fn group_by_parent(entries: &[StorageAggregateEntry]) -> Vec<LotGroup> {
    let mut groups: BTreeMap<(String, String), LotGroup> = BTreeMap::new();

    for entry in entries {
        let key = (entry.family_root().to_string(), entry.flavor_id.clone());
        let group = groups.entry(key).or_insert_with(|| LotGroup {
            parent_lot_id: entry.family_root().to_string(),
            flavor_id: entry.flavor_id.clone(),
            parent: None,
            children: Vec::new(),
        });
        if entry.is_child() {
            group.children.push(entry.clone());
        } else {
            group.parent = Some(entry.clone());
        }
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(lot_id: &str, grams: f64, location: &str) -> StorageAggRow {
        StorageAggRow {
            lot_id: lot_id.to_string(),
            factory_code: "GT".to_string(),
            flavor_id: "F1".to_string(),
            grams: Some(grams),
            packs_equiv: None,
            locations: if location.is_empty() {
                Vec::new()
            } else {
                vec![location.to_string()]
            },
            manufactured_at: "2024-05-01".to_string(),
        }
    }

    fn ratio(flavor: &str) -> Option<f64> {
        (flavor == "F1").then_some(850.0)
    }

    #[test]
    fn test_keep_then_use_nets_to_nothing() {
        let rows = [row("GT-20240501-001", 500.0, "冷蔵庫"), row("GT-20240501-001", -500.0, "")];
        assert!(aggregate_storage(&rows, ratio).is_empty());
    }

    #[test]
    fn test_near_zero_dropped() {
        let rows = [
            row("GT-20240501-001", 0.1, "A"),
            row("GT-20240501-001", 0.2, "A"),
            row("GT-20240501-001", -0.3, "A"),
        ];
        assert!(aggregate_storage(&rows, ratio).is_empty());
    }

    #[test]
    fn test_sums_and_unions_locations() {
        let mut late = row("GT-20240501-001", 1700.0, "冷凍庫");
        late.manufactured_at = "2024-05-03".to_string();
        let rows = [
            row("GT-20240501-001", 2550.0, "冷蔵庫"),
            row("GT-20240501-002", 100.0, "冷蔵庫"),
            late,
            row("GT-20240501-001", -850.0, "冷蔵庫"),
        ];
        let entries = aggregate_storage(&rows, ratio);
        assert_eq!(entries.len(), 2);
        let first = &entries[0];
        assert_eq!(first.lot_id, "GT-20240501-001");
        assert_eq!(first.grams, 3400.0);
        assert_eq!(first.packs_equiv, Some(4.0));
        assert_eq!(first.locations, vec!["冷蔵庫", "冷凍庫"]);
        assert_eq!(first.manufactured_at, "2024-05-01");
    }

    #[test]
    fn test_unknown_ratio_has_no_pack_equivalent() {
        let mut r = row("GT-20240501-001", 500.0, "A");
        r.flavor_id = "OEM-X".to_string();
        assert_eq!(aggregate_storage(&[r], ratio)[0].packs_equiv, None);
    }

    #[test]
    fn test_server_pack_equivalent_for_unknown_flavor() {
        let mut first = row("GT-20240501-001", 600.0, "A");
        first.flavor_id = "OEM-X".to_string();
        first.packs_equiv = Some(2.0);
        let mut second = first.clone();
        second.grams = Some(300.0);
        second.packs_equiv = Some(1.0);
        assert_eq!(aggregate_storage(&[first, second], ratio)[0].packs_equiv, Some(3.0));

        // masters ratio wins when the flavor is known
        let mut known = row("GT-20240501-002", 1700.0, "A");
        known.packs_equiv = Some(9.0);
        assert_eq!(aggregate_storage(&[known], ratio)[0].packs_equiv, Some(2.0));
    }

    #[test]
    fn test_children_nest_under_parent() {
        let rows = [
            row("GT-20240501-001-02", 300.0, "B"),
            row("GT-20240501-001", 200.0, "A"),
            row("GT-20240501-001-01", 100.0, "A"),
            row("GT-20240430-004-01", 50.0, "C"),
            row("misc", 10.0, "D"),
        ];
        let groups = group_by_parent(&aggregate_storage(&rows, ratio));
        assert_eq!(groups.len(), 3);

        let family = groups
            .iter()
            .find(|g| g.parent_lot_id == "GT-20240501-001")
            .unwrap();
        assert_eq!(family.parent.as_ref().unwrap().grams, 200.0);
        let children: Vec<&str> = family.children.iter().map(|c| c.lot_id.as_str()).collect();
        assert_eq!(children, vec!["GT-20240501-001-02", "GT-20240501-001-01"]);
        assert_eq!(family.total_grams(), 600.0);
        assert_eq!(family.locations(), vec!["A", "B"]);

        let orphan = groups
            .iter()
            .find(|g| g.parent_lot_id == "GT-20240430-004")
            .unwrap();
        assert!(orphan.parent.is_none());
        assert_eq!(orphan.children.len(), 1);
    }

    #[test]
    fn test_groups_split_by_flavor() {
        let mut other = row("GT-20240501-001-01", 100.0, "A");
        other.flavor_id = "F2".to_string();
        let rows = [row("GT-20240501-001-02", 100.0, "A"), other];
        let groups = group_by_parent(&aggregate_storage(&rows, ratio));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].total_packs_equiv(), None);
    }
}
