//! Application error type

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// Used for everything the core can decide on its own: validation of a
/// mutation before it is sent, malformed lot identifiers, missing masters.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Get the category for this error
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether this error was raised before anything reached the ledger
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationFailed
                | ErrorCode::RequiredField
                | ErrorCode::ValueOutOfRange
                | ErrorCode::InvalidFormat
                | ErrorCode::PacksExceedRemaining
                | ErrorCode::SplitNotAllowed
                | ErrorCode::OrderHasNoLines
                | ErrorCode::FlavorNotAllowed
                | ErrorCode::FlavorNotFound
                | ErrorCode::UseNotFound
                | ErrorCode::LocationUnknown
                | ErrorCode::InvalidLotId
        )
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a required field error
    pub fn required(field: &str) -> Self {
        Self::with_message(ErrorCode::RequiredField, format!("{} is required", field))
            .with_detail("field", field)
    }

    /// Create an out-of-range error
    pub fn out_of_range(field: &str, msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValueOutOfRange, msg).with_detail("field", field)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an invalid lot identifier error
    pub fn invalid_lot_id(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self::with_message(
            ErrorCode::InvalidLotId,
            format!("'{}' is not a lot identifier", raw),
        )
        .with_detail("lot_id", raw)
    }

    /// Create a masters unavailable error
    pub fn masters_unavailable(reason: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::MastersUnavailable, reason)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::FlavorNotFound);
        assert_eq!(err.message, "Flavor not found");
        assert!(err.details.is_none());
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_required_carries_field_detail() {
        let err = AppError::required("location");
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.to_string(), "location is required");
        let details = err.details.unwrap();
        assert_eq!(details.get("field"), Some(&Value::from("location")));
    }

    #[test]
    fn test_validation_classification() {
        assert!(AppError::validation("x").is_validation());
        assert!(AppError::out_of_range("grams", "too small").is_validation());
        assert!(!AppError::internal("boom").is_validation());
        assert!(!AppError::masters_unavailable("no factories").is_validation());
    }
}
