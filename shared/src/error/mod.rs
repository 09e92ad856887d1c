//! Unified error system for the bookstore backend
//!
//! This module provides the error handling surface shared by every service:
//! - [`ErrorCode`]: standardized error codes for all failure modes
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 8xxx: Account errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! // Create a simple error
//! let err = AppError::new(ErrorCode::OrderNotFound);
//!
//! // Create an error with a custom message
//! let err = AppError::with_message(ErrorCode::StockInsufficient, "only 2 left");
//!
//! // Domain constructors carry the offending id as a detail
//! let err = AppError::book_not_found("b-42");
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{AppError, AppResult};
