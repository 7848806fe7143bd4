//! Client error types

use shared::{AppError, ErrorCode};
use std::time::Duration;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No answer within the bounded wait
    #[error("Ledger did not answer within {0:?}")]
    Timeout(Duration),

    /// The ledger understood the request and refused it
    #[error("Ledger rejected the request: {message}")]
    Rejected { code: ErrorCode, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error reported by the ledger
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain error raised locally
    #[error(transparent)]
    App(#[from] AppError),
}

impl ClientError {
    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// The call may or may not have taken effect on the ledger.
    ///
    /// Callers must refresh before deciding whether to retry.
    pub fn is_unknown_outcome(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => !e.is_builder() && !e.is_status() && !e.is_decode(),
            _ => false,
        }
    }

    /// Error code for display and logging
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Timeout(_) => ErrorCode::TimeoutError,
            Self::Rejected { code, .. } => *code,
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorCode::InvalidFormat,
            Self::Unauthorized => ErrorCode::InvalidRequest,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::App(e) => e.code,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Outcome of a gated mutation that did not succeed
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected locally before sending; no request id is held
    #[error(transparent)]
    Validation(AppError),

    /// The same action is already being submitted
    #[error("Request already in flight (request_id: {request_id})")]
    InFlight { request_id: String },

    /// Sent and failed; the request id stays held for the retry
    #[error("{source} (request_id: {request_id})")]
    Failed {
        request_id: String,
        source: ClientError,
    },

    /// Refresh needed before submitting failed; nothing was sent
    #[error("Refresh failed: {0}")]
    Refresh(ClientError),
}

impl GatewayError {
    /// Request id to quote in support requests
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::InFlight { request_id } | Self::Failed { request_id, .. } => Some(request_id),
            Self::Validation(_) | Self::Refresh(_) => None,
        }
    }

    /// The ledger may have applied the mutation; refresh before retrying
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, Self::Failed { source, .. } if source.is_unknown_outcome())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code,
            Self::InFlight { .. } => ErrorCode::RequestInFlight,
            Self::Failed { source, .. } => source.code(),
            Self::Refresh(e) => e.code(),
        }
    }
}

impl From<AppError> for GatewayError {
    fn from(err: AppError) -> Self {
        Self::Validation(err)
    }
}

/// Result type for gated mutations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_outcome() {
        assert!(ClientError::Timeout(Duration::from_secs(90)).is_unknown_outcome());
        assert!(!ClientError::rejected(ErrorCode::LotIdConflict, "taken").is_unknown_outcome());
        assert!(!ClientError::Validation("bad".into()).is_unknown_outcome());
    }

    #[test]
    fn test_failed_display_carries_request_id() {
        let err = GatewayError::Failed {
            request_id: "req-1".into(),
            source: ClientError::Timeout(Duration::from_secs(90)),
        };
        assert!(err.to_string().ends_with("(request_id: req-1)"));
        assert_eq!(err.request_id(), Some("req-1"));
        assert!(err.is_unknown_outcome());
        assert_eq!(err.code(), ErrorCode::TimeoutError);

        let err = GatewayError::from(AppError::required("lot_id"));
        assert_eq!(err.request_id(), None);
        assert_eq!(err.code(), ErrorCode::RequiredField);
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            ClientError::rejected(ErrorCode::LotIdConflict, "taken").code(),
            ErrorCode::LotIdConflict
        );
        assert_eq!(
            ClientError::Timeout(Duration::from_secs(1)).code(),
            ErrorCode::TimeoutError
        );
        assert_eq!(
            ClientError::from(AppError::invalid_lot_id("x")).code(),
            ErrorCode::InvalidLotId
        );
    }
}
