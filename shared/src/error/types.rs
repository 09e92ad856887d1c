//! Error type and result alias

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type of the backend, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (offending ids, context, etc.)
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
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

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an authorization failure (unknown user or wrong password —
    /// indistinguishable on purpose)
    pub fn authorization_failed() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    // ==================== Domain constructors ====================

    /// Unknown user id
    pub fn user_not_found(user_id: &str) -> Self {
        Self::with_message(ErrorCode::UserNotFound, format!("user {} not found", user_id))
            .with_detail("user_id", user_id)
    }

    /// User id already registered
    pub fn user_already_exists(user_id: &str) -> Self {
        Self::with_message(
            ErrorCode::UserAlreadyExists,
            format!("user {} already exists", user_id),
        )
        .with_detail("user_id", user_id)
    }

    /// Unknown store id
    pub fn store_not_found(store_id: &str) -> Self {
        Self::with_message(
            ErrorCode::StoreNotFound,
            format!("store {} not found", store_id),
        )
        .with_detail("store_id", store_id)
    }

    /// Store id already taken
    pub fn store_already_exists(store_id: &str) -> Self {
        Self::with_message(
            ErrorCode::StoreAlreadyExists,
            format!("store {} already exists", store_id),
        )
        .with_detail("store_id", store_id)
    }

    /// Unknown book id within a store
    pub fn book_not_found(book_id: &str) -> Self {
        Self::with_message(ErrorCode::BookNotFound, format!("book {} not found", book_id))
            .with_detail("book_id", book_id)
    }

    /// Book id already listed in the store
    pub fn book_already_exists(book_id: &str) -> Self {
        Self::with_message(
            ErrorCode::BookAlreadyExists,
            format!("book {} already exists", book_id),
        )
        .with_detail("book_id", book_id)
    }

    /// Stock level below the requested count
    pub fn stock_insufficient(book_id: &str) -> Self {
        Self::with_message(
            ErrorCode::StockInsufficient,
            format!("insufficient stock for book {}", book_id),
        )
        .with_detail("book_id", book_id)
    }

    /// Unknown order id
    pub fn order_not_found(order_id: &str) -> Self {
        Self::with_message(
            ErrorCode::OrderNotFound,
            format!("order {} not found", order_id),
        )
        .with_detail("order_id", order_id)
    }

    /// Order is not in a status that allows the requested transition
    pub fn order_status_invalid(order_id: &str) -> Self {
        Self::with_message(
            ErrorCode::OrderStatusInvalid,
            format!("invalid status for order {}", order_id),
        )
        .with_detail("order_id", order_id)
    }

    /// Order belongs to a different user
    pub fn order_not_owned(order_id: &str) -> Self {
        Self::with_message(
            ErrorCode::OrderNotOwned,
            format!("order {} belongs to a different user", order_id),
        )
        .with_detail("order_id", order_id)
    }

    /// Order has not been shipped yet
    pub fn order_not_shipped(order_id: &str) -> Self {
        Self::with_message(
            ErrorCode::OrderNotShipped,
            format!("order {} has not been shipped", order_id),
        )
        .with_detail("order_id", order_id)
    }

    /// Buyer balance below the order total
    pub fn insufficient_funds(order_id: &str) -> Self {
        Self::with_message(
            ErrorCode::InsufficientFunds,
            format!("insufficient funds for order {}", order_id),
        )
        .with_detail("order_id", order_id)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_message() {
        let err = AppError::with_message(ErrorCode::ValidationFailed, "count must be positive");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "count must be positive");
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("bad request")
            .with_detail("field", "count")
            .with_detail("reason", "non-positive");

        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "count");
        assert_eq!(details.get("reason").unwrap(), "non-positive");
    }

    #[test]
    fn test_domain_constructors_carry_ids() {
        let err = AppError::stock_insufficient("b1");
        assert_eq!(err.code, ErrorCode::StockInsufficient);
        assert_eq!(err.details.unwrap().get("book_id").unwrap(), "b1");

        let err = AppError::user_not_found("u1");
        assert_eq!(err.code, ErrorCode::UserNotFound);
        assert_eq!(err.message, "user u1 not found");
    }

    #[test]
    fn test_authorization_failed_is_auth_category() {
        let err = AppError::authorization_failed();
        assert_eq!(err.code.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "order o1 not found");
        assert_eq!(format!("{}", err), "order o1 not found");
    }

    #[test]
    fn test_app_error_serialize() {
        let err = AppError::insufficient_funds("o1");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("5001"));
        assert!(json.contains("insufficient funds for order o1"));
    }
}
