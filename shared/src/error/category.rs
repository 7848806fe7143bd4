//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Lot identifier errors (1xxx)
    Lot,
    /// Order errors (2xxx)
    Order,
    /// Storage errors (3xxx)
    Storage,
    /// Masters errors (4xxx)
    Masters,
    /// Mutation errors (5xxx)
    Mutation,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Lot,
            2000..3000 => Self::Order,
            3000..4000 => Self::Storage,
            4000..5000 => Self::Masters,
            5000..6000 => Self::Mutation,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Lot => "lot",
            Self::Order => "order",
            Self::Storage => "storage",
            Self::Masters => "masters",
            Self::Mutation => "mutation",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Lot);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Order);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Storage);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Masters);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Mutation);
        assert_eq!(ErrorCategory::from_code(7000), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::Success.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::InvalidLotId.category(), ErrorCategory::Lot);
        assert_eq!(ErrorCode::OrderNotFound.category(), ErrorCategory::Order);
        assert_eq!(
            ErrorCode::InsufficientStock.category(),
            ErrorCategory::Storage
        );
        assert_eq!(
            ErrorCode::MastersUnavailable.category(),
            ErrorCategory::Masters
        );
        assert_eq!(
            ErrorCode::DuplicateRequest.category(),
            ErrorCategory::Mutation
        );
        assert_eq!(ErrorCode::TimeoutError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Masters).unwrap();
        assert_eq!(json, "\"masters\"");
        let category: ErrorCategory = serde_json::from_str("\"mutation\"").unwrap();
        assert_eq!(category, ErrorCategory::Mutation);
        assert_eq!(category.name(), "mutation");
    }
}
