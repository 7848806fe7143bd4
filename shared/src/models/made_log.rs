//! Production log returned by `GET made-log`

use super::lenient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome recorded for a production event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MadeLogStatus {
    /// 製造完了 - produced, leftover kept
    #[serde(rename = "製造完了")]
    Completed,
    /// 全量使用 - produced and fully used
    #[serde(rename = "全量使用")]
    FullyUsed,
}

/// One production event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MadeLogRow {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub action_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub factory_code: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub lot_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub flavor_id: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub flavor_name: String,
    /// `yyyy-MM-dd`
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub manufactured_at: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub produced_grams: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub produced_packs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub leftover_grams: Option<f64>,
    pub status: MadeLogStatus,
}

/// Response envelope of `GET made-log`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MadeLogResponse {
    #[serde(default)]
    pub rows: Vec<MadeLogRow>,
}

/// Query of `GET made-log`; both bounds inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MadeLogQuery {
    pub factory_code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MadeLogQuery {
    pub fn new(factory_code: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            factory_code: factory_code.into(),
            start,
            end,
        }
    }

    /// Whether a `yyyy-MM-dd` manufacture date falls in the range
    pub fn contains(&self, manufactured_at: &str) -> bool {
        crate::util::parse_ledger_date(manufactured_at)
            .is_some_and(|d| d >= self.start && d <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_ledger_labels() {
        let json = serde_json::to_string(&MadeLogStatus::FullyUsed).unwrap();
        assert_eq!(json, "\"全量使用\"");
        let status: MadeLogStatus = serde_json::from_str("\"製造完了\"").unwrap();
        assert_eq!(status, MadeLogStatus::Completed);
    }

    #[test]
    fn test_query_range_is_inclusive() {
        let query = MadeLogQuery::new(
            "GT",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        );
        assert!(query.contains("2024-05-01"));
        assert!(query.contains("2024-05-31"));
        assert!(!query.contains("2024-06-01"));
        assert!(!query.contains(""));
    }
}
