//! Unified error codes for the bookstore backend
//!
//! Error codes are shared between the server and any frontend speaking to
//! it, organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 8xxx: Account errors
//! - 9xxx: System errors

use super::category::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
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

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (user id / password)
    InvalidCredentials = 1002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is not in a status that allows the requested transition
    OrderStatusInvalid = 4002,
    /// Order belongs to a different user
    OrderNotOwned = 4003,
    /// Order has not been shipped yet
    OrderNotShipped = 4004,

    // ==================== 5xxx: Payment ====================
    /// Buyer balance is below the order total
    InsufficientFunds = 5001,

    // ==================== 6xxx: Catalog ====================
    /// Store not found
    StoreNotFound = 6001,
    /// Store id already taken
    StoreAlreadyExists = 6002,
    /// Book not found in the store
    BookNotFound = 6003,
    /// Book id already listed in the store
    BookAlreadyExists = 6004,
    /// Stock level below the requested count
    StockInsufficient = 6005,

    // ==================== 8xxx: Account ====================
    /// User not found
    UserNotFound = 8001,
    /// User id already registered
    UserAlreadyExists = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database/storage layer error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Get the default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::NotAuthenticated => "Not authenticated",
            Self::InvalidCredentials => "Invalid user id or password",

            Self::OrderNotFound => "Order not found",
            Self::OrderStatusInvalid => "Invalid order status for this operation",
            Self::OrderNotOwned => "Order belongs to a different user",
            Self::OrderNotShipped => "Order has not been shipped",

            Self::InsufficientFunds => "Insufficient funds",

            Self::StoreNotFound => "Store not found",
            Self::StoreAlreadyExists => "Store already exists",
            Self::BookNotFound => "Book not found",
            Self::BookAlreadyExists => "Book already exists",
            Self::StockInsufficient => "Insufficient stock",

            Self::UserNotFound => "User not found",
            Self::UserAlreadyExists => "User already exists",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code(), self.message())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,

            1001 => Self::NotAuthenticated,
            1002 => Self::InvalidCredentials,

            4001 => Self::OrderNotFound,
            4002 => Self::OrderStatusInvalid,
            4003 => Self::OrderNotOwned,
            4004 => Self::OrderNotShipped,

            5001 => Self::InsufficientFunds,

            6001 => Self::StoreNotFound,
            6002 => Self::StoreAlreadyExists,
            6003 => Self::BookNotFound,
            6004 => Self::BookAlreadyExists,
            6005 => Self::StockInsufficient,

            8001 => Self::UserNotFound,
            8002 => Self::UserAlreadyExists,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,

            other => return Err(other),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::StockInsufficient.code(), 6005);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_category_classification() {
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::InvalidCredentials.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::OrderStatusInvalid.category(), ErrorCategory::Order);
        assert_eq!(ErrorCode::InsufficientFunds.category(), ErrorCategory::Payment);
        assert_eq!(ErrorCode::BookNotFound.category(), ErrorCategory::Catalog);
        assert_eq!(ErrorCode::UserNotFound.category(), ErrorCategory::Account);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_try_from_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotAuthenticated,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderNotShipped,
            ErrorCode::InsufficientFunds,
            ErrorCode::StockInsufficient,
            ErrorCode::UserAlreadyExists,
            ErrorCode::InternalError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown_value() {
        assert_eq!(ErrorCode::try_from(7777), Err(7777));
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::OrderNotFound).unwrap();
        assert_eq!(json, "4001");
        let back: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(back, ErrorCode::OrderNotFound);
    }
}
