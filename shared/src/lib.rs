//! Shared types for the bookstore backend
//!
//! This crate holds everything the server crate and its embedders need to
//! agree on:
//!
//! - **error**: unified error codes and the [`AppError`] result type
//! - **order**: order lifecycle types (status, records, history views)
//! - **models**: catalog data (book metadata)
//! - **util**: timestamp and order-id helpers

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-export the most used types at the crate root
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::BookInfo;
pub use order::{
    OrderDraftItem, OrderHistory, OrderHistoryView, OrderItemView, OrderLine, OrderRecord,
    OrderStatus,
};
