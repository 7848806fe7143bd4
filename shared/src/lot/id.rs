use crate::error::AppError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `(parent)(-child)?` where parent is `FACTORY-YYYYMMDD-SEQ`
static LOT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([A-Z0-9]+)-(\d{8})-(\d+))(?:-(\d+))?$").expect("lot id pattern is valid")
});

/// Parsed lot identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotId {
    /// Uppercase alphanumeric factory code
    pub factory_code: String,
    /// `YYYYMMDD`
    pub date_segment: String,
    /// Top-level per-factory-per-day sequence
    pub sequence: u32,
    /// Split-child counter, when this is a child lot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_sequence: Option<u32>,
}

impl LotId {
    /// Parent lot id for a factory, day and sequence
    pub fn new(factory_code: impl Into<String>, sequence: u32, date: NaiveDate) -> Self {
        Self {
            factory_code: factory_code.into(),
            date_segment: date_segment(date),
            sequence,
            child_sequence: None,
        }
    }

    /// Parse `FACTORY-YYYYMMDD-SEQ(-NN)?`; `None` when the string is not a lot id
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = LOT_ID_PATTERN.captures(raw)?;
        let sequence = caps.get(4)?.as_str().parse().ok()?;
        let child_sequence = match caps.get(5) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            factory_code: caps.get(2)?.as_str().to_string(),
            date_segment: caps.get(3)?.as_str().to_string(),
            sequence,
            child_sequence,
        })
    }

    /// Split child `n` (1-based) of this lot's parent
    pub fn child(&self, child_sequence: u32) -> Self {
        Self {
            child_sequence: Some(child_sequence),
            ..self.parent()
        }
    }

    /// This lot with any child suffix dropped
    pub fn parent(&self) -> Self {
        Self {
            child_sequence: None,
            ..self.clone()
        }
    }

    pub fn is_child(&self) -> bool {
        self.child_sequence.is_some()
    }

    /// `factory-date` key sequences are counted under
    pub fn sequence_key(&self) -> String {
        sequence_key(&self.factory_code, &self.date_segment)
    }

    /// Calendar date of the date segment, if it is a real date
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_segment, "%Y%m%d").ok()
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:03}",
            self.factory_code, self.date_segment, self.sequence
        )?;
        if let Some(child) = self.child_sequence {
            write!(f, "-{:02}", child)?;
        }
        Ok(())
    }
}

impl FromStr for LotId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::invalid_lot_id(s))
    }
}

/// `FACTORY-YYYYMMDD-SEQ` with the sequence padded to 3 digits
pub fn format_lot_id(factory_code: &str, sequence: u32, date: NaiveDate) -> String {
    LotId::new(factory_code, sequence, date).to_string()
}

/// `YYYYMMDD`
pub fn date_segment(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub(crate) fn sequence_key(factory_code: &str, date_segment: &str) -> String {
    format!("{}-{}", factory_code, date_segment)
}

/// Parent of a split-child lot id, as a prefix of the input.
///
/// `None` for parent lots and for strings that are not lot ids.
pub fn parent_lot_id(lot_id: &str) -> Option<&str> {
    let caps = LOT_ID_PATTERN.captures(lot_id)?;
    caps.get(5)?;
    caps.get(1).map(|m| m.as_str())
}

pub fn is_child_lot(lot_id: &str) -> bool {
    parent_lot_id(lot_id).is_some()
}

/// The lot a display grouping hangs under: the parent for children, the id itself otherwise
pub fn family_root(lot_id: &str) -> &str {
    parent_lot_id(lot_id).unwrap_or(lot_id)
}
