//! Order lifecycle types
//!
//! An order lives in two places with different lifetimes:
//!
//! - [`OrderRecord`] + [`OrderLine`]s: the in-flight order, present only
//!   while the payment/cancel decision is still open
//! - [`OrderHistory`]: the durable audit record, kept forever and carrying
//!   the status timeline

mod types;

pub use types::{
    OrderDraftItem, OrderHistory, OrderHistoryView, OrderItemView, OrderLine, OrderRecord,
    OrderStatus,
};
