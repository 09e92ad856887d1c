//! OrderEngine - order lifecycle orchestration
//!
//! The engine drives every order through the state machine
//! `pending → paid → shipped → received`, with `cancelled` reachable only
//! from `pending`, against three collaborators:
//!
//! - [`AccountService`]: identity, authentication, and the balance ledger
//! - [`CatalogService`]: store ownership and conditional stock updates
//! - [`OrderStorage`]: in-flight orders and the append-only history
//!
//! # Consistency
//!
//! There is no transaction spanning the collaborators, so multi-record
//! workflows are sagas:
//!
//! ```text
//! new_order:
//!     ├─ decrement stock per item (conditional, atomic per row)
//!     │    └─ on failure: compensating increments, abort
//!     ├─ persist record + lines + pending history (one transaction)
//!     └─ arm expiry timer for this order_id
//!
//! payment:
//!     ├─ checks: owner, password, status == pending, resolve seller
//!     ├─ debit buyer (conditional, the compensable step)
//!     ├─ claim the order record ── the exactly-once arbiter
//!     │    └─ lost the race: refund buyer, report invalid status
//!     ├─ history: pending → paid
//!     └─ credit seller
//!
//! cancel (buyer or expiry timer):
//!     ├─ checks: owner, status == pending
//!     ├─ claim the order record ── same arbiter
//!     ├─ history: pending → cancelled
//!     └─ return reserved stock (compensating increments)
//! ```
//!
//! Whichever of {payment, explicit cancel, expiry cancel} claims the order
//! first wins; the losers observe `OrderNotFound` / `OrderStatusInvalid`
//! and no money or stock moves twice.

use super::expiry::ExpiryTimers;
use super::storage::{HistoryUpdate, OrderStorage};
use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use rust_decimal::Decimal;
use shared::order::{
    OrderDraftItem, OrderHistory, OrderHistoryView, OrderLine, OrderRecord, OrderStatus,
};
use shared::{AppError, AppResult, ErrorCode};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Order lifecycle engine
pub struct OrderEngine {
    storage: OrderStorage,
    accounts: Arc<AccountService>,
    catalog: Arc<CatalogService>,
    expiry: ExpiryTimers,
    order_ttl: Duration,
    /// Handed to expiry tasks so they can call back without keeping the
    /// engine alive
    weak_self: Weak<OrderEngine>,
}

impl OrderEngine {
    /// Create a new engine
    ///
    /// Must be called from within a tokio runtime — the expiry scheduler
    /// captures it to spawn its timers. `shutdown` stops all outstanding
    /// expiry timers when cancelled.
    pub fn new(
        storage: OrderStorage,
        accounts: Arc<AccountService>,
        catalog: Arc<CatalogService>,
        order_ttl: Duration,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            storage,
            accounts,
            catalog,
            expiry: ExpiryTimers::new(shutdown),
            order_ttl,
            weak_self: weak_self.clone(),
        })
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    /// Number of currently armed expiry timers
    pub fn armed_timers(&self) -> usize {
        self.expiry.active()
    }

    // ========================================================================
    // new_order
    // ========================================================================

    /// Create an order, reserving stock for every requested item
    ///
    /// The per-item decrement is a saga: if any item is missing or short on
    /// stock, every decrement already applied in this call is compensated
    /// with an increment before the error is returned.
    pub fn new_order(
        &self,
        user_id: &str,
        store_id: &str,
        items: &[OrderDraftItem],
    ) -> AppResult<String> {
        if items.is_empty() {
            return Err(AppError::validation("order must contain at least one item"));
        }
        if items.iter().any(|item| item.count == 0) {
            return Err(AppError::validation("item count must be positive"));
        }
        if !self.accounts.exists(user_id)? {
            return Err(AppError::user_not_found(user_id));
        }
        if !self.catalog.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }

        let order_id = shared::util::order_id(user_id, store_id);
        let mut lines: Vec<OrderLine> = Vec::with_capacity(items.len());
        let mut reserved: Vec<(String, u32)> = Vec::new();

        for item in items {
            let info = match self.catalog.get_book(store_id, &item.book_id) {
                Ok(info) => info,
                Err(err) => {
                    self.release_reservation(store_id, &reserved);
                    return Err(err);
                }
            };
            if let Err(err) = self.catalog.decrement_stock(store_id, &item.book_id, item.count) {
                self.release_reservation(store_id, &reserved);
                return Err(err);
            }
            reserved.push((item.book_id.clone(), item.count));
            lines.push(OrderLine {
                order_id: order_id.clone(),
                book_id: item.book_id.clone(),
                count: item.count,
                price: info.price * Decimal::from(item.count),
            });
        }

        let now = shared::util::now_millis();
        let record = OrderRecord {
            order_id: order_id.clone(),
            user_id: user_id.to_string(),
            store_id: store_id.to_string(),
            created_at: now,
        };
        let history = OrderHistory::pending(
            order_id.clone(),
            user_id.to_string(),
            store_id.to_string(),
            now,
        );
        if let Err(err) = self.storage.insert_order(&record, &lines, &history) {
            self.release_reservation(store_id, &reserved);
            return Err(err.into());
        }

        self.expiry.arm(
            self.weak_self.clone(),
            user_id.to_string(),
            order_id.clone(),
            self.order_ttl,
        );

        tracing::info!(order_id = %order_id, items = lines.len(), "Order created");
        Ok(order_id)
    }

    /// Re-arm expiry timers for orders left pending by a previous run
    ///
    /// Called once at startup. Each order gets a fresh full TTL; the exact
    /// remaining time is not tracked across restarts.
    pub fn rearm_pending(&self) -> AppResult<usize> {
        let ids = self.storage.active_order_ids()?;
        let mut armed = 0;
        for order_id in ids {
            if let Some(order) = self.storage.get_order(&order_id)? {
                self.expiry.arm(
                    self.weak_self.clone(),
                    order.user_id,
                    order_id,
                    self.order_ttl,
                );
                armed += 1;
            }
        }
        if armed > 0 {
            tracing::info!(armed, "Re-armed expiry timers for pending orders");
        }
        Ok(armed)
    }

    /// Error for an order with no in-flight record: the history tells a
    /// settled order (invalid status) apart from an id that never existed
    fn settled_or_missing(&self, order_id: &str) -> AppResult<AppError> {
        Ok(match self.storage.get_history(order_id)? {
            Some(history) if history.status != OrderStatus::Pending => {
                AppError::order_status_invalid(order_id)
            }
            _ => AppError::order_not_found(order_id),
        })
    }

    /// Compensating increments for a partially reserved order
    fn release_reservation(&self, store_id: &str, reserved: &[(String, u32)]) {
        for (book_id, count) in reserved {
            if let Err(err) = self.catalog.increment_stock(store_id, book_id, *count) {
                tracing::error!(
                    store_id = %store_id,
                    book_id = %book_id,
                    count = *count,
                    error = %err,
                    "Failed to return reserved stock"
                );
            }
        }
    }

    // ========================================================================
    // payment
    // ========================================================================

    /// Pay for a pending order, moving the total from buyer to seller
    pub fn payment(&self, user_id: &str, password: &str, order_id: &str) -> AppResult<()> {
        let Some(order) = self.storage.get_order(order_id)? else {
            return Err(self.settled_or_missing(order_id)?);
        };
        if order.user_id != user_id {
            return Err(AppError::order_not_owned(order_id));
        }
        self.accounts.authenticate(user_id, password)?;

        let Some(history) = self.storage.get_history(order_id)? else {
            return Err(AppError::order_not_found(order_id));
        };
        if history.status != OrderStatus::Pending {
            return Err(AppError::order_status_invalid(order_id));
        }

        // A store without a resolvable owner is corrupted state, not a
        // caller mistake
        let seller = self
            .catalog
            .owner_of_store(&order.store_id)
            .map_err(|err| AppError::internal(format!("store owner lookup failed: {err}")))?;
        if !self.accounts.exists(&seller)? {
            return Err(AppError::internal(format!(
                "store {} owner {} has no account",
                order.store_id, seller
            )));
        }

        let total: Decimal = self
            .storage
            .order_lines(order_id)?
            .iter()
            .map(|line| line.price)
            .sum();

        // Best-effort: the timer may fire concurrently, the claim below
        // arbitrates
        self.expiry.disarm(order_id);

        self.accounts.debit(user_id, total).map_err(|err| {
            if err.code == ErrorCode::InsufficientFunds {
                AppError::insufficient_funds(order_id)
            } else {
                err
            }
        })?;

        // The claim: exactly one of payment / cancel gets the record
        if self.storage.take_order(order_id)?.is_none() {
            // Lost the race to a cancellation; give the money back
            if let Err(err) = self.accounts.credit(user_id, total) {
                tracing::error!(
                    order_id = %order_id,
                    user_id = %user_id,
                    amount = %total,
                    error = %err,
                    "Refund after lost payment race failed"
                );
            }
            return Err(AppError::order_status_invalid(order_id));
        }

        let applied = self.storage.update_history_status(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Paid,
            shared::util::now_millis(),
        )?;
        if applied != HistoryUpdate::Applied {
            // Unreachable after a successful claim; log loudly if it happens
            tracing::error!(order_id = %order_id, outcome = ?applied, "History update after claim failed");
        }

        self.accounts.credit(&seller, total).map_err(|err| {
            tracing::error!(
                order_id = %order_id,
                seller = %seller,
                amount = %total,
                error = %err,
                "Seller credit failed after buyer debit"
            );
            AppError::internal(format!("failed to credit seller: {err}"))
        })?;

        tracing::info!(order_id = %order_id, total = %total, "Order paid");
        Ok(())
    }

    // ========================================================================
    // cancel
    // ========================================================================

    /// Cancel a pending order, returning its reserved stock
    ///
    /// Invoked by the buyer or by the expiry timer; both go through the
    /// same claim, so a double cancellation (or a cancel racing a payment)
    /// resolves to exactly one winner.
    pub fn cancel_order(&self, user_id: &str, order_id: &str) -> AppResult<()> {
        let Some(order) = self.storage.get_order(order_id)? else {
            return Err(self.settled_or_missing(order_id)?);
        };
        if order.user_id != user_id {
            return Err(AppError::order_not_owned(order_id));
        }
        let Some(history) = self.storage.get_history(order_id)? else {
            return Err(AppError::order_not_found(order_id));
        };
        if history.status != OrderStatus::Pending {
            return Err(AppError::order_status_invalid(order_id));
        }

        self.expiry.disarm(order_id);

        let Some((order, lines)) = self.storage.take_order(order_id)? else {
            return Err(AppError::order_status_invalid(order_id));
        };

        let applied = self.storage.update_history_status(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            shared::util::now_millis(),
        )?;
        if applied != HistoryUpdate::Applied {
            tracing::error!(order_id = %order_id, outcome = ?applied, "History update after claim failed");
        }

        // The cancel decision is durable; stock restoration failures are
        // surfaced in the log, not to the caller
        for line in &lines {
            if let Err(err) =
                self.catalog
                    .increment_stock(&order.store_id, &line.book_id, line.count)
            {
                tracing::error!(
                    order_id = %order_id,
                    book_id = %line.book_id,
                    count = line.count,
                    error = %err,
                    "Failed to restore reserved stock"
                );
            }
        }

        tracing::info!(order_id = %order_id, "Order cancelled");
        Ok(())
    }

    /// Expiry-timer entry point: cancel if still pending, discard otherwise
    pub(crate) fn handle_expiry(&self, user_id: &str, order_id: &str) {
        match self.cancel_order(user_id, order_id) {
            Ok(()) => {
                tracing::info!(order_id = %order_id, "Pending order auto-cancelled after expiry")
            }
            Err(err)
                if matches!(
                    err.code,
                    ErrorCode::OrderNotFound | ErrorCode::OrderStatusInvalid
                ) =>
            {
                // The order left pending before the timer fired
                tracing::debug!(order_id = %order_id, "Expiry fired after order settled");
            }
            Err(err) => {
                tracing::error!(order_id = %order_id, error = %err, "Expiry-driven cancellation failed")
            }
        }
    }

    // ========================================================================
    // fulfillment
    // ========================================================================

    /// Seller marks a paid order as shipped
    pub fn ship_order(&self, seller_id: &str, store_id: &str, order_id: &str) -> AppResult<()> {
        if !self.accounts.exists(seller_id)? {
            return Err(AppError::user_not_found(seller_id));
        }
        if !self.catalog.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }
        let Some(history) = self.storage.get_history(order_id)? else {
            return Err(AppError::order_not_found(order_id));
        };
        if history.store_id != store_id {
            return Err(AppError::order_not_found(order_id));
        }

        match self.storage.update_history_status(
            order_id,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            shared::util::now_millis(),
        )? {
            HistoryUpdate::Applied => {
                tracing::info!(order_id = %order_id, "Order shipped");
                Ok(())
            }
            HistoryUpdate::Missing => Err(AppError::order_not_found(order_id)),
            HistoryUpdate::Conflict(_) => Err(AppError::order_status_invalid(order_id)),
        }
    }

    /// Buyer confirms receipt of a shipped order
    pub fn receive_order(&self, user_id: &str, order_id: &str) -> AppResult<()> {
        let Some(history) = self.storage.get_history(order_id)? else {
            return Err(AppError::order_not_found(order_id));
        };
        if history.user_id != user_id {
            return Err(AppError::order_not_owned(order_id));
        }

        match self.storage.update_history_status(
            order_id,
            OrderStatus::Shipped,
            OrderStatus::Received,
            shared::util::now_millis(),
        )? {
            HistoryUpdate::Applied => {
                tracing::info!(order_id = %order_id, "Order received");
                Ok(())
            }
            HistoryUpdate::Missing => Err(AppError::order_not_found(order_id)),
            HistoryUpdate::Conflict(_) => Err(AppError::order_not_shipped(order_id)),
        }
    }

    // ========================================================================
    // read models
    // ========================================================================

    /// A buyer's order history, joined with archived line items
    pub fn get_order_history(&self, user_id: &str) -> AppResult<Vec<OrderHistoryView>> {
        if !self.accounts.exists(user_id)? {
            return Err(AppError::user_not_found(user_id));
        }
        let entries = self.storage.history_for_user(user_id)?;
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let items = self
                .storage
                .history_lines(&entry.order_id)?
                .into_iter()
                .map(Into::into)
                .collect();
            views.push(OrderHistoryView {
                order_id: entry.order_id,
                status: entry.status,
                items,
            });
        }
        Ok(views)
    }

    /// All history entries of a store (seller-facing)
    pub fn store_orders(&self, seller_id: &str, store_id: &str) -> AppResult<Vec<OrderHistory>> {
        if !self.accounts.exists(seller_id)? {
            return Err(AppError::user_not_found(seller_id));
        }
        if !self.catalog.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }
        Ok(self.storage.history_for_store(store_id)?)
    }
}

#[cfg(test)]
mod tests;
