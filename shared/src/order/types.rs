//! Shared order types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Status
// ============================================================================

/// Order status along the lifecycle
///
/// Transitions are monotonic: pending → paid → shipped → received, with
/// cancelled reachable only from pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Received,
    Cancelled,
}

impl OrderStatus {
    /// Whether the requested transition is allowed by the state machine
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid)
                | (Self::Pending, Self::Cancelled)
                | (Self::Paid, Self::Shipped)
                | (Self::Shipped, Self::Received)
        )
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ============================================================================
// In-flight order
// ============================================================================

/// Requested item when creating an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderDraftItem {
    pub book_id: String,
    pub count: u32,
}

impl OrderDraftItem {
    pub fn new(book_id: impl Into<String>, count: u32) -> Self {
        Self {
            book_id: book_id.into(),
            count,
        }
    }
}

/// In-flight order record
///
/// Presence in the order store is the authoritative signal that the
/// payment/cancel decision is still open; removing it is the exactly-once
/// arbiter for leaving the pending state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: String,
    pub user_id: String,
    pub store_id: String,
    /// Unix millis
    pub created_at: i64,
}

/// Order line item, immutable once created
///
/// `price` is the line total (unit price × count) snapshotted at
/// order-creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub order_id: String,
    pub book_id: String,
    pub count: u32,
    pub price: Decimal,
}

// ============================================================================
// History
// ============================================================================

/// Durable order history entry
///
/// Append-only except for `status` and the timestamp of each transition
/// reached. Outlives the in-flight [`OrderRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderHistory {
    pub order_id: String,
    pub user_id: String,
    pub store_id: String,
    pub status: OrderStatus,
    /// Unix millis
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

impl OrderHistory {
    /// New pending entry, created together with the in-flight order
    pub fn pending(order_id: String, user_id: String, store_id: String, created_at: i64) -> Self {
        Self {
            order_id,
            user_id,
            store_id,
            status: OrderStatus::Pending,
            created_at,
            paid_at: None,
            shipped_at: None,
            received_at: None,
            cancelled_at: None,
        }
    }

    /// Apply a transition, stamping the matching timestamp
    ///
    /// The caller is responsible for having validated the transition; this
    /// only records it.
    pub fn apply(&mut self, next: OrderStatus, at: i64) {
        self.status = next;
        match next {
            OrderStatus::Paid => self.paid_at = Some(at),
            OrderStatus::Shipped => self.shipped_at = Some(at),
            OrderStatus::Received => self.received_at = Some(at),
            OrderStatus::Cancelled => self.cancelled_at = Some(at),
            OrderStatus::Pending => {}
        }
    }
}

/// Single line of an order as returned to buyers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemView {
    pub book_id: String,
    pub count: u32,
    pub price: Decimal,
}

impl From<OrderLine> for OrderItemView {
    fn from(line: OrderLine) -> Self {
        Self {
            book_id: line.book_id,
            count: line.count,
            price: line.price,
        }
    }
}

/// History entry joined with its line items (read model for buyers)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderHistoryView {
    pub order_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemView>,
}
