use super::id::{LotId, date_segment, parent_lot_id, sequence_key};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Next top-level sequence for `factory_code` on `date_segment`.
///
/// Child suffixes are ignored, so `GT-20240501-003-02` counts as sequence 3.
/// Ids that are not lot ids, or belong to another factory or day, are skipped.
/// Returns 1 when nothing matches.
pub fn next_sequence<'a, I>(existing: I, factory_code: &str, date_segment: &str) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(LotId::parse)
        .filter(|lot| lot.factory_code == factory_code && lot.date_segment == date_segment)
        .map(|lot| lot.sequence)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Next split-child number for the lot `parent`.
///
/// `existing` are lot ids of already-recorded split events (repeats allowed,
/// one per event). The result is the number of distinct children plus one,
/// raised past the highest recorded child number so an existing child is
/// never reissued when the history has gaps.
pub fn next_child_sequence<'a, I>(existing: I, parent: &str) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    let children: BTreeSet<u32> = existing
        .into_iter()
        .filter(|id| parent_lot_id(id) == Some(parent))
        .filter_map(|id| LotId::parse(id)?.child_sequence)
        .collect();

    let count = u32::try_from(children.len()).unwrap_or(u32::MAX);
    let highest = children.last().copied().unwrap_or(0);
    count.max(highest).saturating_add(1)
}

/// Per-process floor under the sequences handed out for each factory and day.
///
/// The ledger's order list is the source of truth, but a freshly created
/// order may not show up in it before the next lot is minted. The counter
/// remembers what this process already reserved so two back-to-back
/// reservations never return the same sequence.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    next: HashMap<String, u32>,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next sequence given the freshest known lot ids.
    ///
    /// The result is at least `next_sequence(existing)` and strictly greater
    /// than anything this counter reserved before for the same key.
    pub fn reserve<'a, I>(&mut self, existing: I, factory_code: &str, date: NaiveDate) -> u32
    where
        I: IntoIterator<Item = &'a str>,
    {
        let segment = date_segment(date);
        let fresh = next_sequence(existing, factory_code, &segment);
        let floor = self.next.entry(sequence_key(factory_code, &segment)).or_insert(1);
        let reserved = fresh.max(*floor);
        *floor = reserved.saturating_add(1);
        reserved
    }

    /// Reserve and format a parent lot id
    pub fn reserve_lot<'a, I>(&mut self, existing: I, factory_code: &str, date: NaiveDate) -> LotId
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sequence = self.reserve(existing, factory_code, date);
        LotId::new(factory_code, sequence, date)
    }

    /// Lowest sequence the next reservation may return for a key
    pub fn floor(&self, factory_code: &str, date: NaiveDate) -> u32 {
        self.next
            .get(&sequence_key(factory_code, &date_segment(date)))
            .copied()
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_next_sequence_empty() {
        assert_eq!(next_sequence([], "GT", "20240501"), 1);
        assert_eq!(next_sequence(["misc", "OS-1"], "GT", "20240501"), 1);
    }

    #[test]
    fn test_next_sequence_filters_key_and_ignores_children() {
        let ids = [
            "GT-20240501-001",
            "GT-20240501-003-02",
            "GT-20240502-009",
            "KX-20240501-010",
            "not-a-lot",
        ];
        assert_eq!(next_sequence(ids, "GT", "20240501"), 4);
        assert_eq!(next_sequence(ids, "GT", "20240502"), 10);
        assert_eq!(next_sequence(ids, "KX", "20240501"), 11);
        assert_eq!(next_sequence(ids, "KX", "20240502"), 1);
    }

    #[test]
    fn test_next_sequence_exceeds_every_existing() {
        let ids: Vec<String> = [7u32, 2, 15, 1, 9]
            .iter()
            .map(|s| format!("GT-20240501-{:03}", s))
            .collect();
        let next = next_sequence(ids.iter().map(String::as_str), "GT", "20240501");
        for id in &ids {
            assert!(next > LotId::parse(id).unwrap().sequence);
        }
        assert_eq!(next, 16);
    }

    #[test]
    fn test_next_child_sequence() {
        let parent = "GT-20240501-001";
        assert_eq!(next_child_sequence([], parent), 1);

        let events = [
            "GT-20240501-001-01",
            "GT-20240501-001-01",
            "GT-20240501-001-02",
            "GT-20240501-002-07",
            "GT-20240501-001",
        ];
        assert_eq!(next_child_sequence(events, parent), 3);
        assert_eq!(next_child_sequence(events, "GT-20240501-002"), 8);
    }

    #[test]
    fn test_next_child_sequence_skips_past_gaps() {
        let events = ["GT-20240501-001-03"];
        assert_eq!(next_child_sequence(events, "GT-20240501-001"), 4);
    }

    #[test]
    fn test_counter_is_monotonic_without_refresh() {
        let mut counter = SequenceCounter::new();
        let stale = ["GT-20240501-001"];
        assert_eq!(counter.reserve(stale, "GT", day(1)), 2);
        assert_eq!(counter.reserve(stale, "GT", day(1)), 3);
        assert_eq!(counter.floor("GT", day(1)), 4);
        // other keys are independent
        assert_eq!(counter.reserve(stale, "GT", day(2)), 1);
        assert_eq!(counter.reserve([], "KX", day(1)), 1);
    }

    #[test]
    fn test_counter_follows_fresher_ledger() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.reserve([], "GT", day(1)), 1);
        let refreshed = ["GT-20240501-001", "GT-20240501-002", "GT-20240501-005"];
        let lot = counter.reserve_lot(refreshed, "GT", day(1));
        assert_eq!(lot.to_string(), "GT-20240501-006");
    }
}
