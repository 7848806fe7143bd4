//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Lot identifier errors
//! - 2xxx: Order errors
//! - 3xxx: Storage errors
//! - 4xxx: Masters errors
//! - 5xxx: Mutation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Lot ====================
    /// String is not a lot identifier
    InvalidLotId = 1001,
    /// Lot identifier already taken at the ledger
    LotIdConflict = 1002,
    /// Lot not found
    LotNotFound = 1003,

    // ==================== 2xxx: Order ====================
    /// Order not found
    OrderNotFound = 2001,
    /// Order is archived
    OrderArchived = 2002,
    /// Reported packs exceed the remaining packs
    PacksExceedRemaining = 2003,
    /// Split reporting not allowed for this order line
    SplitNotAllowed = 2004,
    /// Order has no lines
    OrderHasNoLines = 2005,

    // ==================== 3xxx: Storage ====================
    /// Not enough stock held for the lot
    InsufficientStock = 3001,
    /// Storage location unknown for the factory
    LocationUnknown = 3002,

    // ==================== 4xxx: Masters ====================
    /// Masters data missing or empty
    MastersUnavailable = 4001,
    /// Flavor not found
    FlavorNotFound = 4002,
    /// Factory not found
    FactoryNotFound = 4003,
    /// Use code not found
    UseNotFound = 4004,
    /// Flavor not allowed for the selected use
    FlavorNotAllowed = 4005,

    // ==================== 5xxx: Mutation ====================
    /// Request identifier already applied
    DuplicateRequest = 5001,
    /// A request for this action is still in flight
    RequestInFlight = 5002,
    /// Ledger rejected the mutation
    LedgerRejected = 5003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Network error
    NetworkError = 9002,
    /// Timeout
    TimeoutError = 9003,
    /// Configuration error
    ConfigError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Lot
            ErrorCode::InvalidLotId => "Not a lot identifier",
            ErrorCode::LotIdConflict => "Lot identifier already exists",
            ErrorCode::LotNotFound => "Lot not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderArchived => "Order is archived",
            ErrorCode::PacksExceedRemaining => "Packs exceed the remaining packs",
            ErrorCode::SplitNotAllowed => "Split reporting is not allowed for this order",
            ErrorCode::OrderHasNoLines => "Order has no lines",

            // Storage
            ErrorCode::InsufficientStock => "Insufficient stock for the lot",
            ErrorCode::LocationUnknown => "Storage location is unknown",

            // Masters
            ErrorCode::MastersUnavailable => "Masters data is unavailable",
            ErrorCode::FlavorNotFound => "Flavor not found",
            ErrorCode::FactoryNotFound => "Factory not found",
            ErrorCode::UseNotFound => "Use code not found",
            ErrorCode::FlavorNotAllowed => "Flavor is not allowed for this use",

            // Mutation
            ErrorCode::DuplicateRequest => "Request was already applied",
            ErrorCode::RequestInFlight => "A request for this action is already in flight",
            ErrorCode::LedgerRejected => "Ledger rejected the request",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Lot
            1001 => Ok(ErrorCode::InvalidLotId),
            1002 => Ok(ErrorCode::LotIdConflict),
            1003 => Ok(ErrorCode::LotNotFound),

            // Order
            2001 => Ok(ErrorCode::OrderNotFound),
            2002 => Ok(ErrorCode::OrderArchived),
            2003 => Ok(ErrorCode::PacksExceedRemaining),
            2004 => Ok(ErrorCode::SplitNotAllowed),
            2005 => Ok(ErrorCode::OrderHasNoLines),

            // Storage
            3001 => Ok(ErrorCode::InsufficientStock),
            3002 => Ok(ErrorCode::LocationUnknown),

            // Masters
            4001 => Ok(ErrorCode::MastersUnavailable),
            4002 => Ok(ErrorCode::FlavorNotFound),
            4003 => Ok(ErrorCode::FactoryNotFound),
            4004 => Ok(ErrorCode::UseNotFound),
            4005 => Ok(ErrorCode::FlavorNotAllowed),

            // Mutation
            5001 => Ok(ErrorCode::DuplicateRequest),
            5002 => Ok(ErrorCode::RequestInFlight),
            5003 => Ok(ErrorCode::LedgerRejected),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::NetworkError),
            9003 => Ok(ErrorCode::TimeoutError),
            9004 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::InvalidLotId,
            ErrorCode::OrderNotFound,
            ErrorCode::InsufficientStock,
            ErrorCode::FlavorNotAllowed,
            ErrorCode::RequestInFlight,
            ErrorCode::TimeoutError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_code_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::LotIdConflict).unwrap();
        assert_eq!(json, "1002");
        let code: ErrorCode = serde_json::from_str("5001").unwrap();
        assert_eq!(code, ErrorCode::DuplicateRequest);
        assert!(serde_json::from_str::<ErrorCode>("77").is_err());
    }
}
