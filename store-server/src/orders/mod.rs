//! Order lifecycle module
//!
//! This module implements the order state machine and its persistence:
//!
//! - **storage**: redb-based persistence for in-flight orders and the
//!   append-only history, including the atomic order claim and the history
//!   status compare-and-set
//! - **engine**: the `OrderEngine` orchestrating creation, payment,
//!   cancellation, shipment, and receipt against the account and catalog
//!   collaborators
//! - **expiry**: keyed one-shot timers that auto-cancel orders left
//!   pending past the configured TTL
//!
//! # Data Flow
//!
//! ```text
//! new_order ──► reserve stock per item (saga, compensated on failure)
//!           ──► OrderRecord + lines + pending history (one transaction)
//!           ──► arm expiry timer for this order_id
//!
//! payment / cancel ──► claim = atomic removal of the OrderRecord
//!                       (exactly-once: whoever claims first wins)
//! ```

pub mod engine;
pub mod expiry;
pub mod storage;

// Re-exports
pub use engine::OrderEngine;
pub use expiry::ExpiryTimers;
pub use storage::{HistoryUpdate, OrderStorage};

// Re-export shared types for convenience
pub use shared::order::{
    OrderDraftItem, OrderHistory, OrderHistoryView, OrderItemView, OrderLine, OrderRecord,
    OrderStatus,
};
