//! Unified error system for the batch ledger
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Lot identifier errors
//! - 2xxx: Order errors
//! - 3xxx: Storage errors
//! - 4xxx: Masters (reference data) errors
//! - 5xxx: Mutation / idempotency errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::OrderNotFound);
//! assert_eq!(err.code, ErrorCode::OrderNotFound);
//!
//! let err = AppError::validation("grams must be positive").with_detail("field", "grams");
//! assert!(err.is_validation());
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
